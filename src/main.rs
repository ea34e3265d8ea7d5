use chrono::prelude::*;
use clap::Parser;
use log::*;
use std::error::Error;
use std::process::exit;

mod buildings;
mod course_api;
mod database;
mod engine;
mod locations;
mod menu;
mod timeslot;

use buildings::*;
use course_api::*;
use database::*;
use engine::*;
use menu::*;
use timeslot::*;

/// ECF - Empty Classroom Finder
#[derive(Parser, Debug)]
#[command(name = "classroom-finder")]
struct Args {
    /// Building, floor, or full room name (e.g. THH, THH1, THH101)
    query: Option<String>,

    /// Specific time to check (e.g. 3pm, 14:00, 2:30pm, now)
    #[arg(long, value_name = "TIME", conflicts_with = "full")]
    at: Option<String>,

    /// Show full-day availability
    #[arg(long)]
    full: bool,

    /// Day of the week (M, T, W, Th, F, or Sat)
    #[arg(long, value_name = "DAY")]
    day: Option<String>,

    /// Scrape fresh course and building data before answering
    #[arg(long)]
    update: bool,
}

async fn run_update() -> Result<(), Box<dyn Error>> {
    info!("Updating building directory...");

    match update_building_directory().await {
        Ok(buildings) => {
            save_building_database(&buildings)?;
            info!("Saved {} buildings", buildings.len());
        }
        Err(error) => error!("Building directory update failed: {}", error),
    }

    info!("Scraping course catalog... (may take several minutes)");

    let sections = scrape_all_sections().await?;

    if sections.is_empty() {
        return Err("catalog scrape returned no sections".into());
    }

    save_course_database(&sections)?;
    info!("Saved {} sections", sections.len());

    Ok(())
}

fn run_query(grid: &AvailabilityGrid, args: &Args) {
    let prefix = args.query.clone().unwrap_or_default().trim().to_uppercase();

    if !prefix.is_empty() && !grid.has_room_matching(&prefix) {
        eprintln!("Error: No rooms or buildings found matching '{}'.", prefix);
        exit(1);
    }

    let day = match &args.day {
        Some(text) => match Day::new_from_query(text) {
            Some(day) => day,
            None => {
                eprintln!("Invalid day '{}'. Use M, T, W, Th, F, or Sat.", text);
                exit(1);
            }
        },
        None => match Day::new_from_weekday(Local::now().weekday()) {
            Some(day) => day,
            None => {
                println!("No classes run on Sundays; every room is free.");
                return;
            }
        },
    };

    if args.full {
        let shown = if prefix.is_empty() { "all rooms" } else { prefix.as_str() };

        println!("Showing full availability for {} on {}...\n", shown, day.to_token());
        print_full_availability(grid, &prefix, day);
        return;
    }

    let slot = match args.at.as_deref() {
        None | Some("now") => current_time_slot(&Local::now()),
        Some(text) => match time_to_slot(text) {
            Some(slot) => slot,
            None => {
                eprintln!("Invalid time format: {}", text);
                exit(1);
            }
        },
    };

    println!(
        "Checking rooms available at {} on {}...\n",
        slot_to_time(slot),
        day.to_token()
    );
    print_free_rooms_at(grid, &prefix, day, slot);
}

fn main() {
    std::env::set_var("RUST_LOG", "info");
    env_logger::init();

    ctrlc::set_handler(move || {
        println!();
        exit(0);
    })
    .expect("Error setting Ctrl-C handler");

    let args = Args::parse();

    if args.update {
        let result = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .thread_name("scrape-tokio")
            .build()
            .unwrap()
            .block_on(run_update());

        if let Err(error) = result {
            error!("Update failed: {}", error);
            exit(1);
        }
    }

    let sections = load_course_database().unwrap_or_default();

    if sections.is_empty() {
        eprintln!("No course data found; run with --update to scrape the catalog first.");
        exit(1);
    }

    let raw_buildings = load_building_database().unwrap_or_default();

    if raw_buildings.is_empty() {
        warn!("No building directory found; building rankings will be empty.");
    }

    let directory = BuildingDirectory::new_from_buildings(&raw_buildings);

    let grid = AvailabilityGrid::build(&sections, &directory);
    let stats = grid.stats();
    info!(
        "Built grid from {} sections ({} scheduled, {} meetings, {} ranges dropped, {} double-booked slot writes)",
        stats.total_sections,
        stats.scheduled_sections,
        stats.meetings,
        stats.dropped_ranges,
        stats.conflicting_writes
    );

    let ranked = grid.ranked_buildings(&directory, MIN_ROOMS_TO_DISPLAY, MIN_COURSES_TO_DISPLAY);

    if args.query.is_none() && args.at.is_none() && !args.full && args.day.is_none() {
        run_interactive(&grid, &ranked);
    } else {
        run_query(&grid, &args);
    }
}
