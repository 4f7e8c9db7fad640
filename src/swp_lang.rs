// Localized UI strings (English and Chinese)
// Format strings use "{}" placeholders filled with `Lang::fill`

use chrono::NaiveDate;

#[derive(Clone)]
pub struct Assets {
    // Menu items
    pub menu_help: &'static str,
    pub menu_new: &'static str,
    pub menu_save: &'static str,
    pub menu_load: &'static str,
    pub menu_difficulty: &'static str,
    pub menu_records: &'static str,
    pub menu_language: &'static str,
    pub menu_exit: &'static str,

    // Difficulty names
    pub diff_easy: &'static str,
    pub diff_medium: &'static str,
    pub diff_hard: &'static str,
    pub diff_custom: &'static str,

    // Help modal
    pub help_title: &'static str,
    pub help_lines: [&'static str; 7],

    // Records modal
    pub rec_best_time: &'static str,
    pub rec_no_record: &'static str,

    // Game over
    pub win_message: &'static str,
    pub win_time_fmt: &'static str,        // "Time: {} seconds"
    pub win_time_record_fmt: &'static str, // "Time: {} seconds (New Record!)"
    pub loss_message: &'static str,
    pub again_hint: &'static str,

    // Status bar
    pub status_fmt: &'static str, // " Mines: {}   Time: {} "
    pub status_flag_mode: &'static str,
    pub start_hint: &'static str,

    // Save/load prompt
    pub prompt_save_title: &'static str,
    pub prompt_load_title: &'static str,
    pub prompt_hint: &'static str,

    // Notices
    pub notice_saved_fmt: &'static str,
    pub notice_loaded_fmt: &'static str,
    pub notice_cancelled: &'static str,
    pub notice_error_fmt: &'static str,

    // Terminal size messages
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2: &'static str,
    pub tsmsg_title: &'static str,
}

/// Returns English language assets
pub fn english_assets() -> Assets {
    Assets {
        menu_help: "Help",
        menu_new: "New",
        menu_save: "Save",
        menu_load: "Load",
        menu_difficulty: "Level",
        menu_records: "Records",
        menu_language: "中文",
        menu_exit: "Exit",

        diff_easy: "Easy",
        diff_medium: "Medium",
        diff_hard: "Hard",
        diff_custom: "Custom",

        help_title: "Help",
        help_lines: [
            " Controls:",
            "  Mouse | Arrows      - move cursor",
            "  L-Click | Space | R - reveal",
            "  R-Click (hold) | F  - toggle flag",
            "  Click a number | Q  - open neighbours",
            "  M                   - flagging mode",
            "  F3 / F4             - save / load",
        ],

        rec_best_time: " Best time in seconds:",
        rec_no_record: "-",

        win_message: "Mines Cleared, You Win!",
        win_time_fmt: "Time: {} seconds",
        win_time_record_fmt: "Time: {} seconds (New Record!)",
        loss_message: "Mine Exploded, You Lose!",
        again_hint: "F2 to play again",

        status_fmt: " Mines: {}   Time: {} ",
        status_flag_mode: "[FLAG]",
        start_hint: "Press Space or click to start",

        prompt_save_title: "Save game as",
        prompt_load_title: "Load game",
        prompt_hint: "Enter: confirm   Esc: cancel",

        notice_saved_fmt: "Saved to {}",
        notice_loaded_fmt: "Loaded {}",
        notice_cancelled: "Cancelled",
        notice_error_fmt: "Error: {}",

        tsmsg_line1: "Terminal layout too small",
        tsmsg_line2: "Minimum size required: {} x {}",
        tsmsg_title: "Resize needed",
    }
}

/// Returns Chinese language assets
pub fn chinese_assets() -> Assets {
    Assets {
        menu_help: "帮助",
        menu_new: "新游戏",
        menu_save: "保存",
        menu_load: "读取",
        menu_difficulty: "难度",
        menu_records: "纪录",
        menu_language: "English",
        menu_exit: "退出",

        diff_easy: "初级",
        diff_medium: "中级",
        diff_hard: "高级",
        diff_custom: "自定义",

        help_title: "帮助",
        help_lines: [
            " 操作说明：",
            "  鼠标 | 方向键       - 移动光标",
            "  左键 | 空格 | R     - 翻开",
            "  右键(按住) | F      - 标记/取消",
            "  点击数字 | Q        - 翻开邻近格子",
            "  M                   - 标记模式",
            "  F3 / F4             - 保存 / 读取",
        ],

        rec_best_time: " 最佳时间（秒）：",
        rec_no_record: "-",

        win_message: "地雷已清除，你赢了！",
        win_time_fmt: "用时：{} 秒",
        win_time_record_fmt: "用时：{} 秒（新纪录！）",
        loss_message: "踩到地雷，游戏失败！",
        again_hint: "按 F2 再来一局",

        status_fmt: " 剩余地雷：{}   时间：{} ",
        status_flag_mode: "[标记]",
        start_hint: "按空格或点击开始",

        prompt_save_title: "保存为",
        prompt_load_title: "读取存档",
        prompt_hint: "回车：确认   Esc：取消",

        notice_saved_fmt: "已保存到 {}",
        notice_loaded_fmt: "已读取 {}",
        notice_cancelled: "已取消",
        notice_error_fmt: "错误：{}",

        tsmsg_line1: "终端窗口太小",
        tsmsg_line2: "最小尺寸：{} x {}",
        tsmsg_title: "请调整大小",
    }
}

pub struct Lang {
    current_lang: String,
    pub assets: Assets,
}

impl Lang {
    /// Build from a language code; "zh-CN" and friends map to "zh", anything else to "en"
    pub fn new(lang_code: &str) -> Self {
        let code = normalize(lang_code);
        Lang {
            current_lang: code.to_string(),
            assets: assets_for(code),
        }
    }

    pub fn code(&self) -> &str {
        &self.current_lang
    }

    /// Flip between the two languages, returning the new code
    pub fn toggle(&mut self) -> &str {
        let next = if self.current_lang == "zh" { "en" } else { "zh" };
        *self = Lang::new(next);
        &self.current_lang
    }

    /// Localized difficulty name by index (0=Easy .. 3=Custom)
    pub fn diff_name(&self, index: usize) -> &'static str {
        match index {
            0 => self.assets.diff_easy,
            1 => self.assets.diff_medium,
            2 => self.assets.diff_hard,
            _ => self.assets.diff_custom,
        }
    }

    /// Replace "{}" placeholders in order
    pub fn fill(fmt: &str, args: &[&str]) -> String {
        args.iter()
            .fold(fmt.to_string(), |s, a| s.replacen("{}", a, 1))
    }

    /// ISO date (YYYY-MM-DD) in the local style; anything unparsable is shown as is
    pub fn format_date(&self, iso_date: &str) -> String {
        let Ok(date) = NaiveDate::parse_from_str(iso_date, "%Y-%m-%d") else {
            return iso_date.to_string();
        };
        let pattern = if self.current_lang == "zh" {
            "%Y年%m月%d日"
        } else {
            "%m/%d/%Y"
        };
        date.format(pattern).to_string()
    }
}

fn normalize(lang_code: &str) -> &'static str {
    if lang_code.to_lowercase().starts_with("zh") {
        "zh"
    } else {
        "en"
    }
}

fn assets_for(code: &str) -> Assets {
    if code == "zh" {
        chinese_assets()
    } else {
        english_assets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_normalized() {
        assert_eq!(Lang::new("zh-CN").code(), "zh");
        assert_eq!(Lang::new("fr").code(), "en");
    }

    #[test]
    fn toggle_switches_assets() {
        let mut lang = Lang::new("en");
        assert_eq!(lang.toggle(), "zh");
        assert_eq!(lang.assets.menu_save, "保存");
        assert_eq!(lang.toggle(), "en");
    }

    #[test]
    fn fill_replaces_in_order() {
        assert_eq!(
            Lang::fill(" Mines: {}   Time: {} ", &["-2", "07"]),
            " Mines: -2   Time: 07 "
        );
    }

    #[test]
    fn dates_follow_language() {
        assert_eq!(Lang::new("en").format_date("2026-01-22"), "01/22/2026");
        assert_eq!(Lang::new("zh").format_date("2026-01-22"), "2026年01月22日");
        assert_eq!(Lang::new("en").format_date("someday"), "someday");
    }
}
