use crate::buildings::BuildingDirectory;
use crate::course_api::CourseSection;
use crate::locations::*;
use crate::timeslot::*;
use ::serde::*;
use lazy_static::*;
use log::debug;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};

/// A free run shorter than this many slots is not worth reporting.
pub const MIN_FREE_RUN: usize = 2;

/// Runs starting before this time are cut off; nobody hunts for a room at 7am.
pub const EARLIEST_START: &str = "9:00am";

lazy_static! {
    static ref TIME_RANGE_RE: Regex =
        Regex::new(r"(\d{2}:\d{2}(?:am|pm))-(\d{2}:\d{2}(?:am|pm))").unwrap();
}

type DayGrid = [Option<usize>; SLOTS_PER_DAY];

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMeeting {
    room: String,
    building: String,
    start_slot: Slot,
    end_slot: Slot,
    days: Vec<Day>,
    section_index: usize,
}

impl NormalizedMeeting {
    pub fn get_room(&self) -> &String {
        &self.room
    }

    pub fn get_building(&self) -> &String {
        &self.building
    }

    pub fn get_start_slot(&self) -> Slot {
        self.start_slot
    }

    pub fn get_end_slot(&self) -> Slot {
        self.end_slot
    }

    pub fn get_days(&self) -> &Vec<Day> {
        &self.days
    }

    pub fn get_section_index(&self) -> usize {
        self.section_index
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FreeInterval {
    start: Slot,
    end: Slot,
}

impl FreeInterval {
    pub fn new(start: Slot, end: Slot) -> FreeInterval {
        FreeInterval { start, end }
    }

    pub fn get_start(&self) -> Slot {
        self.start
    }

    /// Exclusive; a run touching the end of the day reports SLOTS_PER_DAY.
    pub fn get_end(&self) -> Slot {
        self.end
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.start <= slot && slot < self.end
    }
}

/// Counters from one grid build. Dropped and skipped records are normal
/// (online/TBA sections); the counts exist so callers can report them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BuildStats {
    pub total_sections: usize,
    pub scheduled_sections: usize,
    pub meetings: usize,
    pub dropped_ranges: usize,
    pub conflicting_writes: usize,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BuildingSummary {
    code: String,
    name: String,
    room_count: usize,
    section_count: usize,
}

impl BuildingSummary {
    pub fn get_code(&self) -> &String {
        &self.code
    }

    pub fn get_name(&self) -> &String {
        &self.name
    }

    pub fn get_room_count(&self) -> usize {
        self.room_count
    }

    pub fn get_section_count(&self) -> usize {
        self.section_count
    }
}

#[derive(Clone, Debug)]
struct BuildingTally {
    code: String,
    rooms: HashSet<String>,
    sections: usize,
}

/// Per-room, per-day slot owners for one load of the catalog. Built once,
/// then queried read-only; rebuild from scratch to pick up new data.
#[derive(Clone, Debug)]
pub struct AvailabilityGrid {
    rooms: BTreeMap<String, [DayGrid; 6]>,
    meetings: Vec<NormalizedMeeting>,
    tallies: Vec<BuildingTally>,
    stats: BuildStats,
}

impl AvailabilityGrid {
    pub fn build(sections: &[CourseSection], directory: &BuildingDirectory) -> AvailabilityGrid {
        let known_buildings = directory.code_set();

        let mut grid = AvailabilityGrid {
            rooms: BTreeMap::new(),
            meetings: Vec::new(),
            tallies: Vec::new(),
            stats: BuildStats::default(),
        };

        grid.stats.total_sections = sections.len();

        for (section_index, section) in sections.iter().enumerate() {
            let (ranges, dropped) = extract_time_ranges(section.get_time());
            grid.stats.dropped_ranges += dropped;

            if ranges.is_empty() {
                continue;
            }

            let days = extract_days(section.get_days());
            let mut scheduled = false;

            for room in split_location(section.get_location()) {
                let building = match resolve_building_prefix(&room, known_buildings) {
                    Some(building) => building,
                    None => continue,
                };

                scheduled = true;
                grid.tally_building(&building, &room, known_buildings);

                for &(start_slot, end_slot) in &ranges {
                    let meeting = NormalizedMeeting {
                        room: room.clone(),
                        building: building.clone(),
                        start_slot,
                        end_slot,
                        days: days.clone(),
                        section_index,
                    };

                    grid.place_meeting(meeting);
                }
            }

            if scheduled {
                grid.stats.scheduled_sections += 1;
            }
        }

        debug!(
            "Grid built: {} rooms, {} meetings, {} dropped ranges, {} conflicting writes",
            grid.rooms.len(),
            grid.meetings.len(),
            grid.stats.dropped_ranges,
            grid.stats.conflicting_writes
        );

        grid
    }

    fn tally_building(&mut self, building: &str, room: &str, known_buildings: &HashSet<String>) {
        if !known_buildings.contains(building) {
            return;
        }

        match self.tallies.iter_mut().find(|t| t.code == building) {
            Some(tally) => {
                tally.rooms.insert(room.to_string());
                tally.sections += 1;
            }
            None => {
                let mut rooms = HashSet::new();
                rooms.insert(room.to_string());

                self.tallies.push(BuildingTally {
                    code: building.to_string(),
                    rooms,
                    sections: 1,
                });
            }
        }
    }

    /// Marks the meeting's slots on each of its days. Later meetings simply
    /// overwrite earlier ones; the overlap only shows up in the stats.
    fn place_meeting(&mut self, meeting: NormalizedMeeting) {
        let meeting_id = self.meetings.len();

        let day_grids = self
            .rooms
            .entry(meeting.room.clone())
            .or_insert_with(|| [[None; SLOTS_PER_DAY]; 6]);

        for day in &meeting.days {
            let day_grid = &mut day_grids[day.to_index()];

            for slot in meeting.start_slot..meeting.end_slot {
                if day_grid[slot].is_some() {
                    self.stats.conflicting_writes += 1;
                }

                day_grid[slot] = Some(meeting_id);
            }
        }

        self.meetings.push(meeting);
        self.stats.meetings += 1;
    }

    pub fn get_meetings(&self) -> &Vec<NormalizedMeeting> {
        &self.meetings
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn get_day_grid(&self, room: &str, day: Day) -> Option<&[Option<usize>]> {
        self.rooms
            .get(room)
            .map(|day_grids| &day_grids[day.to_index()][..])
    }

    pub fn has_room_matching(&self, prefix: &str) -> bool {
        let prefix = prefix.to_uppercase();

        self.rooms.keys().any(|room| room.starts_with(&prefix))
    }

    /// For each matching room, the first free run containing `slot`, as
    /// (room, run end). Rooms busy at `slot` are omitted. Scan order is
    /// sorted room codes; an empty prefix matches every room.
    pub fn free_runs_at(&self, prefix: &str, day: Day, slot: Slot) -> Vec<(String, Slot)> {
        let prefix = prefix.to_uppercase();
        let earliest = time_to_slot(EARLIEST_START).unwrap_or(0);

        let mut results = Vec::new();

        for (room, day_grids) in &self.rooms {
            if !room.starts_with(&prefix) {
                continue;
            }

            let runs = find_free_runs(&day_grids[day.to_index()], MIN_FREE_RUN, earliest);

            if let Some(run) = runs.iter().find(|run| run.contains(slot)) {
                results.push((room.clone(), run.get_end()));
            }
        }

        results
    }

    /// Every free run for every matching room on one day, in sorted room
    /// order. Rooms with no free run still appear, with an empty list.
    pub fn free_runs_full(&self, prefix: &str, day: Day) -> Vec<(String, Vec<FreeInterval>)> {
        let prefix = prefix.to_uppercase();
        let earliest = time_to_slot(EARLIEST_START).unwrap_or(0);

        self.rooms
            .iter()
            .filter(|(room, _)| room.starts_with(&prefix))
            .map(|(room, day_grids)| {
                let runs = find_free_runs(&day_grids[day.to_index()], MIN_FREE_RUN, earliest);

                (room.clone(), runs)
            })
            .collect()
    }

    /// Buildings with at least `min_rooms` distinct rooms and `min_sections`
    /// contributing sections, by section count descending. The sort is
    /// stable, so ties keep aggregation order.
    pub fn ranked_buildings(
        &self,
        directory: &BuildingDirectory,
        min_rooms: usize,
        min_sections: usize,
    ) -> Vec<BuildingSummary> {
        let mut summaries: Vec<BuildingSummary> = self
            .tallies
            .iter()
            .filter(|tally| tally.rooms.len() >= min_rooms && tally.sections >= min_sections)
            .filter_map(|tally| {
                let name = directory.get_name(&tally.code)?;

                Some(BuildingSummary {
                    code: tally.code.clone(),
                    name: name.clone(),
                    room_count: tally.rooms.len(),
                    section_count: tally.sections,
                })
            })
            .collect();

        summaries.sort_by(|a, b| b.section_count.cmp(&a.section_count));

        summaries
    }
}

/// Pulls every strict "HH:MMam-HH:MMpm" pair out of a raw time field.
/// Ranges that fail to convert, or run backwards, are dropped and counted;
/// text with no range at all ("TBA") just yields nothing.
fn extract_time_ranges(raw_time: &str) -> (Vec<(Slot, Slot)>, usize) {
    let mut ranges = Vec::new();
    let mut dropped = 0;

    for captures in TIME_RANGE_RE.captures_iter(raw_time) {
        let start = time_to_slot(&captures[1]);
        let end = time_to_slot(&captures[2]);

        match (start, end) {
            (Some(start), Some(end)) if start < end && end < SLOTS_PER_DAY => {
                ranges.push((start, end));
            }
            _ => dropped += 1,
        }
    }

    (ranges, dropped)
}

/// Scans one day array for maximal free runs of at least `min_run` slots,
/// ignoring everything before `earliest`. Ends are exclusive; a run still
/// open at the end of the array closes at SLOTS_PER_DAY.
pub fn find_free_runs(slots: &[Option<usize>], min_run: usize, earliest: Slot) -> Vec<FreeInterval> {
    let mut runs = Vec::new();
    let mut run_start: Option<Slot> = None;

    for (slot, owner) in slots.iter().enumerate() {
        if slot < earliest {
            continue;
        }

        if owner.is_none() {
            if run_start.is_none() {
                run_start = Some(slot);
            }
        } else if let Some(start) = run_start.take() {
            if slot - start >= min_run {
                runs.push(FreeInterval::new(start, slot));
            }
        }
    }

    if let Some(start) = run_start {
        if slots.len() - start >= min_run {
            runs.push(FreeInterval::new(start, slots.len()));
        }
    }

    runs
}
