use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DatePart {
    Year,
    Month,
    Day,
}

/// Segment-by-segment date entry. Digits overwrite the active part, `+`/`-` move by a day.
#[derive(Debug, Clone)]
pub struct DateInputState {
    pub date: NaiveDate,
    pub editing: bool,
    pub date_part: DatePart,
    pub current_date_input: String,
}

impl DateInputState {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            editing: false,
            date_part: DatePart::Year,
            current_date_input: String::new(),
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
        self.date_part = DatePart::Year;
        self.current_date_input.clear();
    }

    pub fn next_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Month,
            DatePart::Month => DatePart::Day,
            DatePart::Day => DatePart::Year,
        };
        self.current_date_input.clear();
    }

    pub fn previous_date_part(&mut self) {
        self.date_part = match self.date_part {
            DatePart::Year => DatePart::Day,
            DatePart::Month => DatePart::Year,
            DatePart::Day => DatePart::Month,
        };
        self.current_date_input.clear();
    }

    fn part_width(&self) -> usize {
        match self.date_part {
            DatePart::Year => 4,
            DatePart::Month | DatePart::Day => 2,
        }
    }

    pub fn handle_input(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.current_date_input.push(c);
                if self.current_date_input.len() == self.part_width() {
                    self.apply_input();
                    self.current_date_input.clear();
                }
            }
            KeyCode::Char('+') => self.shift_days(1),
            KeyCode::Char('-') => self.shift_days(-1),
            KeyCode::Backspace => {
                self.current_date_input.pop();
            }
            KeyCode::Right => self.next_date_part(),
            KeyCode::Left => self.previous_date_part(),
            _ => {}
        }
    }

    fn apply_input(&mut self) {
        let Ok(value) = self.current_date_input.parse::<u32>() else {
            return;
        };
        let (year, month, day) = (self.date.year(), self.date.month(), self.date.day());

        let updated = match self.date_part {
            DatePart::Year if (1900..=2100).contains(&value) => clamped_date(value as i32, month, day),
            DatePart::Month if (1..=12).contains(&value) => clamped_date(year, value, day),
            DatePart::Day => NaiveDate::from_ymd_opt(year, month, value),
            _ => None,
        };

        if let Some(date) = updated {
            self.date = date;
        }
    }

    pub fn shift_days(&mut self, days: i64) {
        if let Some(date) = self.date.checked_add_signed(Duration::days(days)) {
            self.date = date;
        }
    }

    pub fn get_display_string(&self) -> String {
        let (year, month, day) = (
            format!("{:04}", self.date.year()),
            format!("{:02}", self.date.month()),
            format!("{:02}", self.date.day()),
        );

        if !self.editing {
            return format!("{}-{}-{}", year, month, day);
        }

        let current_input = if self.current_date_input.is_empty() {
            match self.date_part {
                DatePart::Year => "[YYYY]".to_string(),
                DatePart::Month => "[MM]".to_string(),
                DatePart::Day => "[DD]".to_string(),
            }
        } else {
            format!("[{}]", self.current_date_input)
        };

        match self.date_part {
            DatePart::Year => format!("{}{}-{}-{}", year, current_input, month, day),
            DatePart::Month => format!("{}-{}{}-{}", year, month, current_input, day),
            DatePart::Day => format!("{}-{}-{}{}", year, month, day, current_input),
        }
    }
}

// Pulls the day back to the end of a shorter month, e.g. Jan 31 -> Feb 28
fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    (1..=day).rev().find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn type_digits(state: &mut DateInputState, digits: &str) {
        for c in digits.chars() {
            state.handle_input(KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_replaces_each_part() {
        let mut state = DateInputState::new(date(2024, 1, 15));
        state.toggle_editing();

        type_digits(&mut state, "2025");
        state.next_date_part();
        type_digits(&mut state, "03");
        state.next_date_part();
        type_digits(&mut state, "09");

        assert_eq!(state.date, date(2025, 3, 9));
    }

    #[test]
    fn month_change_clamps_day() {
        let mut state = DateInputState::new(date(2024, 1, 31));
        state.toggle_editing();
        state.next_date_part();
        type_digits(&mut state, "02");
        assert_eq!(state.date, date(2024, 2, 29));

        let mut state = DateInputState::new(date(2024, 1, 15));
        state.toggle_editing();
        state.next_date_part();
        type_digits(&mut state, "04");
        assert_eq!(state.date, date(2024, 4, 15));
    }

    #[test]
    fn invalid_day_is_ignored() {
        let mut state = DateInputState::new(date(2023, 2, 10));
        state.toggle_editing();
        state.previous_date_part();
        type_digits(&mut state, "30");
        assert_eq!(state.date, date(2023, 2, 10));
    }

    #[test]
    fn plus_and_minus_step_days() {
        let mut state = DateInputState::new(date(2024, 12, 31));
        state.toggle_editing();
        state.handle_input(KeyCode::Char('+'));
        assert_eq!(state.date, date(2025, 1, 1));
        state.handle_input(KeyCode::Char('-'));
        state.handle_input(KeyCode::Char('-'));
        assert_eq!(state.date, date(2024, 12, 30));
    }

    #[test]
    fn ignores_keys_when_not_editing() {
        let mut state = DateInputState::new(date(2024, 5, 5));
        type_digits(&mut state, "1999");
        assert_eq!(state.date, date(2024, 5, 5));
        assert_eq!(state.get_display_string(), "2024-05-05");
    }

    #[test]
    fn display_marks_active_part() {
        let mut state = DateInputState::new(date(2024, 5, 5));
        state.toggle_editing();
        state.next_date_part();
        assert_eq!(state.get_display_string(), "2024-05[MM]-05");
        type_digits(&mut state, "1");
        assert_eq!(state.get_display_string(), "2024-05[1]-05");
    }
}
