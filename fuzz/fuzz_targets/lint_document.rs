#![no_main]

use libfuzzer_sys::fuzz_target;
use microtmpl_engine::{MicroTemplateService, TemplateSettings};
use microtmpl_lint::{builtin_rules, LintConfig, Linter};
use once_cell::sync::Lazy;

static SETTINGS: Lazy<TemplateSettings> = Lazy::new(TemplateSettings::default);
static LINTER: Lazy<Option<Linter>> =
    Lazy::new(|| Linter::new(&builtin_rules(), &LintConfig::default()).ok());

fuzz_target!(|data: &[u8]| {
    let source = match std::str::from_utf8(data) {
        Ok(src) => src,
        Err(_) => return,
    };

    let service = MicroTemplateService::new(source, &SETTINGS);
    for template in service.all_templates() {
        assert_eq!(template.template().len(), source.len());
        let _ = template.document();
    }

    if let Some(linter) = LINTER.as_ref() {
        let _ = linter.fix("fuzz-document", source);
    }
});
