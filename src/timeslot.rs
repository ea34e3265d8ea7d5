use ::serde::*;
use lazy_static::*;
use regex::Regex;

/// One slot is 10 minutes; 144 slots cover the whole day, slot 0 at 12:00 AM.
pub const SLOTS_PER_DAY: usize = 144;

pub type Slot = usize;

lazy_static! {
    static ref DAY_TOKEN_RE: Regex = Regex::new(r"Th|M|T|W|F|Sat").unwrap();
    static ref DAY_QUERY_RE: Regex = Regex::new(r"^(?:TH|M|T|W|F|SAT)").unwrap();
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Day {
    pub fn new_from_token(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Day::Monday),
            "T" => Some(Day::Tuesday),
            "W" => Some(Day::Wednesday),
            "Th" => Some(Day::Thursday),
            "F" => Some(Day::Friday),
            "Sat" => Some(Day::Saturday),
            _ => None,
        }
    }

    pub fn to_token(&self) -> &'static str {
        match self {
            Day::Monday => "M",
            Day::Tuesday => "T",
            Day::Wednesday => "W",
            Day::Thursday => "Th",
            Day::Friday => "F",
            Day::Saturday => "Sat",
        }
    }

    pub fn to_index(&self) -> usize {
        match self {
            Day::Monday => 0,
            Day::Tuesday => 1,
            Day::Wednesday => 2,
            Day::Thursday => 3,
            Day::Friday => 4,
            Day::Saturday => 5,
        }
    }

    pub fn all() -> [Day; 6] {
        [
            Day::Monday,
            Day::Tuesday,
            Day::Wednesday,
            Day::Thursday,
            Day::Friday,
            Day::Saturday,
        ]
    }

    /// Interactive day input: case-insensitive, matched at the start so
    /// "thursday" and "TH" both give Thursday. "T" alone is Tuesday.
    pub fn new_from_query(s: &str) -> Option<Self> {
        let cleaned = s.trim().to_uppercase();
        let token = DAY_QUERY_RE.find(&cleaned)?.as_str();

        match token {
            "M" => Some(Day::Monday),
            "T" => Some(Day::Tuesday),
            "W" => Some(Day::Wednesday),
            "TH" => Some(Day::Thursday),
            "F" => Some(Day::Friday),
            "SAT" => Some(Day::Saturday),
            _ => None,
        }
    }

    pub fn new_from_weekday(weekday: chrono::Weekday) -> Option<Self> {
        match weekday {
            chrono::Weekday::Mon => Some(Day::Monday),
            chrono::Weekday::Tue => Some(Day::Tuesday),
            chrono::Weekday::Wed => Some(Day::Wednesday),
            chrono::Weekday::Thu => Some(Day::Thursday),
            chrono::Weekday::Fri => Some(Day::Friday),
            chrono::Weekday::Sat => Some(Day::Saturday),
            chrono::Weekday::Sun => None,
        }
    }
}

/// Extracts the meeting days from a free-text schedule string.
///
/// "Th" is listed before "T" in the pattern so "TTh" reads as Tuesday and
/// Thursday rather than three fragments. Duplicates collapse to the first
/// mention, keeping input order.
pub fn extract_days(schedule: &str) -> Vec<Day> {
    let mut days = Vec::new();

    for token in DAY_TOKEN_RE.find_iter(schedule) {
        if let Some(day) = Day::new_from_token(token.as_str()) {
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }

    days
}

/// Converts a time string (e.g. "2:30pm", "2pm", "14:00") to a slot value.
///
/// Hours carrying an am/pm marker must be in 1-12; bare hours 13-23 are read
/// as 24-hour times, bare hours 1-12 as their am interpretation. Anything
/// else, including a bad numeric split, is None.
pub fn time_to_slot(text: &str) -> Option<Slot> {
    let cleaned = text.trim().to_lowercase();

    let pm = cleaned.contains("pm");
    let marked = pm || cleaned.contains("am");

    let cleaned = cleaned.replace("am", "").replace("pm", "");
    let cleaned = cleaned.trim();

    let (hour_text, minute_text) = match cleaned.split_once(':') {
        Some((hour, minute)) => (hour, minute),
        None => (cleaned, "0"),
    };

    let hour = hour_text.trim().parse::<usize>().ok()?;
    let minute = minute_text.trim().parse::<usize>().ok()?;

    if minute > 59 {
        return None;
    }

    let hour = if marked {
        if hour < 1 || hour > 12 {
            return None;
        }
        hour % 12 + if pm { 12 } else { 0 }
    } else if hour >= 13 && hour <= 23 {
        hour
    } else {
        if hour < 1 || hour > 12 {
            return None;
        }
        hour % 12
    };

    Some((hour * 60 + minute) / 10)
}

/// Converts a slot value back to a "H:MM AM/PM" string. The final slot of the
/// day renders as "Midnight" for compatibility with the availability display.
pub fn slot_to_time(slot: Slot) -> String {
    let minutes = slot * 10;
    let hour = minutes / 60;
    let minute = minutes % 60;

    let period = if hour >= 12 { "PM" } else { "AM" };
    let hour = if hour % 12 == 0 { 12 } else { hour % 12 };

    let time = format!("{}:{:02} {}", hour, minute, period);

    if time == "11:50 PM" {
        "Midnight".to_string()
    } else {
        time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twelve_hour_boundaries() {
        assert_eq!(time_to_slot("12:00am"), Some(0));
        assert_eq!(time_to_slot("12:00pm"), Some(72));
        assert_eq!(time_to_slot("11:50pm"), Some(143));
        assert_eq!(time_to_slot("12:30AM"), Some(3));
    }

    #[test]
    fn minute_defaults_to_zero() {
        assert_eq!(time_to_slot("2pm"), Some(84));
        assert_eq!(time_to_slot("9am"), Some(54));
    }

    #[test]
    fn bare_24_hour_form() {
        assert_eq!(time_to_slot("14:00"), Some(84));
        assert_eq!(time_to_slot("23:50"), Some(143));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(time_to_slot("13:00pm"), None);
        assert_eq!(time_to_slot("0:30am"), None);
        assert_eq!(time_to_slot("2:60pm"), None);
        assert_eq!(time_to_slot("24:00"), None);
    }

    #[test]
    fn rejects_malformed_text() {
        assert_eq!(time_to_slot(""), None);
        assert_eq!(time_to_slot("noonish"), None);
        assert_eq!(time_to_slot("2:30:15pm"), None);
        assert_eq!(time_to_slot("2:pm"), None);
    }

    #[test]
    fn monotonic_over_the_day() {
        let times = [
            "12:00am", "1:15am", "6:40am", "9:00am", "11:59am", "12:00pm",
            "1:00pm", "4:45pm", "9:30pm", "11:50pm",
        ];

        let slots: Vec<Slot> = times.iter().map(|t| time_to_slot(t).unwrap()).collect();

        for pair in slots.windows(2) {
            assert!(pair[0] <= pair[1], "{:?} not monotonic", slots);
        }
    }

    #[test]
    fn renders_and_round_trips() {
        assert_eq!(slot_to_time(0), "12:00 AM");
        assert_eq!(slot_to_time(72), "12:00 PM");
        assert_eq!(slot_to_time(84), "2:00 PM");
        assert_eq!(slot_to_time(143), "Midnight");

        // Idempotent on its own output, Midnight aside.
        for slot in [0, 7, 54, 72, 100, 142] {
            let text = slot_to_time(slot);
            assert_eq!(time_to_slot(&text), Some(slot));
            assert_eq!(slot_to_time(time_to_slot(&text).unwrap()), text);
        }
    }

    #[test]
    fn extract_days_keeps_order_and_dedups() {
        let days = extract_days("MWF 10:00am");
        assert_eq!(days, vec![Day::Monday, Day::Wednesday, Day::Friday]);

        let days = extract_days("TTh 2:00pm");
        assert_eq!(days, vec![Day::Tuesday, Day::Thursday]);

        let days = extract_days("MWMW");
        assert_eq!(days, vec![Day::Monday, Day::Wednesday]);

        assert!(extract_days("TBA").is_empty());
    }

    #[test]
    fn day_query_normalization() {
        assert_eq!(Day::new_from_query("th"), Some(Day::Thursday));
        assert_eq!(Day::new_from_query("Thursday"), Some(Day::Thursday));
        assert_eq!(Day::new_from_query("t"), Some(Day::Tuesday));
        assert_eq!(Day::new_from_query(" sat "), Some(Day::Saturday));
        assert_eq!(Day::new_from_query("sunday"), None);
        assert_eq!(Day::new_from_query(""), None);
    }
}
