// ==========================================
// 钢卷库区管理系统 - 操作员提示语言
// ==========================================
// 消息目录: locales/zh-CN.yml、locales/en.yml (由 lib.rs 的 i18n! 宏加载)
// 错误提示键: errors.<错误码>,占位符写作 %{name}
// ==========================================

use tracing::warn;

/// 支持的提示语言,首项为默认
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en"];

/// 指定提示语言的环境变量
pub const LOCALE_ENV: &str = "COIL_YARD_LOCALE";

pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 切换提示语言
///
/// # 返回
/// - false: 不支持的语言代码,保持当前语言
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        warn!(locale = %locale, "不支持的提示语言,保持当前语言");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 按环境变量 COIL_YARD_LOCALE 选择提示语言（未设置时使用默认语言）
pub fn init_from_env() {
    let locale = std::env::var(LOCALE_ENV).unwrap_or_else(|_| SUPPORTED_LOCALES[0].to_string());
    if !set_locale(locale.trim()) {
        rust_i18n::set_locale(SUPPORTED_LOCALES[0]);
    }
}

/// 翻译并填充占位符
///
/// ```no_run
/// use coil_yard::i18n::translate;
/// let msg = translate("errors.position_empty", &[("position", "A-01-L1")]);
/// ```
pub fn translate(key: &str, args: &[(&str, &str)]) -> String {
    args.iter().fold(rust_i18n::t!(key).to_string(), |msg, (name, value)| {
        msg.replace(&format!("%{{{}}}", name), value)
    })
}

/// 错误码对应的操作员提示
pub fn error_message(code: &str, args: &[(&str, &str)]) -> String {
    translate(&format!("errors.{}", code), args)
}
