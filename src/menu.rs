use crate::engine::*;
use crate::timeslot::*;
use chrono::prelude::*;
use std::io::{stdin, stdout, Write};

pub const MIN_ROOMS_TO_DISPLAY: usize = 3;
pub const MIN_COURSES_TO_DISPLAY: usize = 4;

const FIRST_COL_WIDTH: usize = 34;
const SECOND_COL_WIDTH: usize = 30;
const SEPARATOR_LENGTH: usize = FIRST_COL_WIDTH + SECOND_COL_WIDTH + 25;

// Filler words dropped first when a building name has to be shortened
const UNNEEDED_WORDS: &[&str] = &["hall", "building", "for", "and", "of", "the"];

/// Shortens a building name to `max_length` by dropping filler words, then
/// trailing words, appending "..." when there is room for it.
pub fn truncate_name(name: &str, max_length: usize) -> String {
    if name.len() <= max_length {
        return name.to_string();
    }

    let mut words: Vec<&str> = name
        .split_whitespace()
        .filter(|word| !UNNEEDED_WORDS.contains(&word.to_lowercase().as_str()))
        .collect();

    let mut current_len =
        words.iter().map(|word| word.len()).sum::<usize>() + words.len().saturating_sub(1);

    if current_len <= max_length {
        return words.join(" ");
    }

    while !words.is_empty() && current_len > max_length {
        current_len -= words[words.len() - 1].len() + 1;
        words.pop();
    }

    let ellipsis = if current_len + 3 > max_length { "" } else { "..." };

    format!("{}{}", words.join(" "), ellipsis)
}

/// Two-column buildings table, filled column-wise, names truncated to fit.
pub fn print_buildings_table(buildings: &[BuildingSummary]) {
    if buildings.is_empty() {
        println!("\nNo buildings meet the display criteria.");
        return;
    }

    let max_room_digits = buildings
        .iter()
        .map(|building| building.get_room_count().to_string().len())
        .max()
        .unwrap_or(1);
    let bracket_width = max_room_digits + 3;

    let mid = (buildings.len() + 1) / 2;
    let left_column = &buildings[..mid];
    let right_column = &buildings[mid..];

    println!("\nPopular Buildings ([n] = Number of rooms): ");
    println!("{}", "=".repeat(SEPARATOR_LENGTH));

    for (i, left) in left_column.iter().enumerate() {
        let left_name = truncate_name(left.get_name(), FIRST_COL_WIDTH);
        let left_count = format!("[{}]", left.get_room_count());
        let left_text = format!(
            "{:<name_width$} ({}) {:<count_width$}",
            left_name,
            left.get_code(),
            left_count,
            name_width = FIRST_COL_WIDTH,
            count_width = bracket_width
        );

        let right_text = match right_column.get(i) {
            Some(right) => {
                let right_name = truncate_name(right.get_name(), SECOND_COL_WIDTH);
                let right_count = format!("[{}]", right.get_room_count());

                format!(
                    "{:<name_width$} ({}) {:<count_width$}",
                    right_name,
                    right.get_code(),
                    right_count,
                    name_width = SECOND_COL_WIDTH,
                    count_width = bracket_width
                )
            }
            None => String::new(),
        };

        println!("{}  {}", left_text, right_text);
    }

    println!("{}", "=".repeat(SEPARATOR_LENGTH));
}

fn end_label(end: Slot) -> String {
    // A run reaching the end of the day reads as "Midnight".
    slot_to_time(end.min(SLOTS_PER_DAY - 1))
}

pub fn print_free_rooms_at(grid: &AvailabilityGrid, prefix: &str, day: Day, slot: Slot) {
    if !grid.has_room_matching(prefix) {
        println!("No rooms found matching '{}'.", prefix);
        return;
    }

    for (room, until) in grid.free_runs_at(prefix, day, slot) {
        println!("{} available until {}", room, end_label(until));
    }
}

pub fn print_full_availability(grid: &AvailabilityGrid, prefix: &str, day: Day) {
    if !grid.has_room_matching(prefix) {
        println!("No rooms found matching '{}'.", prefix);
        return;
    }

    for (room, runs) in grid.free_runs_full(prefix, day) {
        if runs.is_empty() {
            continue;
        }

        println!("\n{} available:", room);

        for run in runs {
            println!(
                "{} to {}",
                slot_to_time(run.get_start()),
                end_label(run.get_end())
            );
        }
    }
}

pub fn current_time_slot(now: &DateTime<Local>) -> Slot {
    ((now.hour() * 60 + now.minute()) / 10) as Slot
}

fn prompt(message: &str) -> String {
    print!("{}", message);
    let _ = stdout().flush();

    let mut line = String::new();
    let _ = stdin().read_line(&mut line);

    line.trim().to_string()
}

fn pause() {
    prompt("\nPress Enter to search again or Ctrl+C to exit...");
}

fn read_valid_time() -> Slot {
    loop {
        if let Some(slot) = time_to_slot(&prompt("> ")) {
            return slot;
        }

        println!("Invalid time format! Please enter a valid time (e.g., 2:30pm).");
    }
}

fn read_valid_day() -> Day {
    loop {
        if let Some(day) = Day::new_from_query(&prompt("> ")) {
            return day;
        }

        println!("Invalid day! Please enter M, T, W, Th, F, or Sat.");
    }
}

fn clear_screen() {
    print!("\x1B[2J\x1B[1;1H");
    let _ = stdout().flush();
}

/// Prompt loop until Ctrl-C. The grid and ranking are built once before
/// entry; every search is a pure read.
pub fn run_interactive(grid: &AvailabilityGrid, ranked: &[BuildingSummary]) {
    loop {
        clear_screen();
        println!("========= Empty Classroom Finder =========");
        print_buildings_table(ranked);

        let prefix =
            prompt("Enter a room or building name (or leave blank to see all): ").to_uppercase();

        if !prefix.is_empty() && !grid.has_room_matching(&prefix) {
            println!("Error: No rooms or buildings found matching '{}'.", prefix);
            pause();
            continue;
        }

        println!("\nWhen do you need the room?");
        println!("1. Right now");
        println!("2. At a specific time");
        println!("3. See full availability for today");
        let choice = prompt("> ");

        match choice.as_str() {
            "1" => {
                let now = Local::now();
                let slot = current_time_slot(&now);

                match Day::new_from_weekday(now.weekday()) {
                    Some(day) => {
                        println!(
                            "\nChecking rooms available at {} today ({})...\n",
                            slot_to_time(slot),
                            day.to_token()
                        );
                        print_free_rooms_at(grid, &prefix, day, slot);
                    }
                    None => println!("\nNo classes run on Sundays; every room is free."),
                }
            }
            "2" => {
                println!("\nEnter time (e.g., 2:00 PM):");
                let slot = read_valid_time();

                println!("\nEnter the day you need the room for (M, T, W, Th, F, or Sat):");
                let day = read_valid_day();

                println!(
                    "\nChecking rooms available at {} on {}...\n",
                    slot_to_time(slot),
                    day.to_token()
                );
                print_free_rooms_at(grid, &prefix, day, slot);
            }
            "3" => match Day::new_from_weekday(Local::now().weekday()) {
                Some(day) => {
                    let shown = if prefix.is_empty() { "all rooms" } else { prefix.as_str() };

                    println!(
                        "\nShowing full availability for {} on {}...\n",
                        shown,
                        day.to_token()
                    );
                    print_full_availability(grid, &prefix, day);
                }
                None => println!("\nNo classes run on Sundays; every room is free."),
            },
            _ => {}
        }

        pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(truncate_name("Taper Hall", 34), "Taper Hall");
        assert_eq!(truncate_name("", 10), "");
    }

    #[test]
    fn filler_words_go_first() {
        assert_eq!(
            truncate_name("School of the Cinematic Arts", 21),
            "School Cinematic Arts"
        );
    }

    #[test]
    fn trailing_words_drop_without_room_for_ellipsis() {
        assert_eq!(truncate_name("Seeley G. Mudd Building", 10), "Seeley G.");
    }

    #[test]
    fn ellipsis_appears_when_it_fits() {
        assert_eq!(truncate_name("AAAA BBBB CCCC DDDD", 12), "AAAA BBBB...");
    }

    #[test]
    fn end_labels_clamp_to_midnight() {
        assert_eq!(end_label(78), "1:00 PM");
        assert_eq!(end_label(143), "Midnight");
        assert_eq!(end_label(SLOTS_PER_DAY), "Midnight");
    }
}
