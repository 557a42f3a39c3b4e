//! Pluralized task count labels.

/// Locale-aware formatter for "N tasks".
pub trait CountLabelFormatter: Send + Sync {
    fn label(&self, count: usize) -> String;
}

/// English: "1 task", "N tasks".
#[derive(Debug, Default, Clone, Copy)]
pub struct EnglishCountLabel;

impl CountLabelFormatter for EnglishCountLabel {
    fn label(&self, count: usize) -> String {
        if count == 1 {
            "1 task".to_string()
        } else {
            format!("{count} tasks")
        }
    }
}

/// Russian plural classes selected by `count % 10` and `count % 100`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RussianCountLabel;

impl CountLabelFormatter for RussianCountLabel {
    fn label(&self, count: usize) -> String {
        let last_digit = count % 10;
        let last_two = count % 100;
        let noun = if last_digit == 1 && last_two != 11 {
            "Задача"
        } else if (2..=4).contains(&last_digit) && !(12..=14).contains(&last_two) {
            "Задачи"
        } else {
            "Задач"
        };
        format!("{count} {noun}")
    }
}
