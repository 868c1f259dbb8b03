use regex::Regex;
use std::sync::LazyLock;

// 巢狀括號只切到第一個 ')'
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthetical pattern"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid line break pattern"));

/// 去掉過敏原等括號註記，`<br/>` 轉成換行
pub fn normalize_dish_text(raw: &str) -> String {
    let without_notes = PARENTHETICAL.replace_all(raw, "");
    let with_newlines = LINE_BREAK.replace_all(&without_notes, "\n");
    with_newlines.trim().to_string()
}
