//! # CSV Report Rendering
//!
//! Renders evaluator output as CSV text. Quoting rule: every field is
//! wrapped in double quotes and embedded quotes are doubled, so titles and
//! names can contain commas or quotes freely. Dates render as DD/MM/YYYY,
//! matching the format the exported reports have always used.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use trt_core::EmployeeId;

use crate::evaluator::{pending_topics, LookbackWindow, PendingEntry};
use crate::refresher::RefresherEntry;
use crate::snapshot::TrainingSnapshot;

/// Render a date as DD/MM/YYYY.
pub fn format_date(date: DateTime<Utc>) -> String {
    format!(
        "{:02}/{:02}/{}",
        date.day(),
        date.month(),
        date.year()
    )
}

/// Quote a single field: wrap in double quotes, double embedded quotes.
fn field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render one row from unquoted field values.
fn row<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| field(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

const REFRESHER_HEADERS: [&str; 8] = [
    "Employee Name",
    "Department",
    "Training Topic",
    "Last Training Date",
    "Days Since Last Training",
    "Status",
    "Priority",
    "Last Rating",
];

/// Render the refresher report.
pub fn refresher_csv(entries: &[RefresherEntry]) -> String {
    let mut lines = vec![row(REFRESHER_HEADERS)];
    for entry in entries {
        lines.push(row([
            entry.employee_name.clone(),
            entry.department.to_string(),
            entry.topic.clone(),
            entry
                .last_training_date
                .map(format_date)
                .unwrap_or_else(|| "Never".to_string()),
            entry
                .days_since
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            entry.status.describe(),
            entry.priority.to_string(),
            entry
                .last_rating
                .map(|r| r.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ]));
    }
    lines.join("\n")
}

const PENDING_HEADERS: [&str; 3] = ["Employee", "Department", "Topic"];

/// Render the pending report: one row per (employee, pending topic).
pub fn pending_csv(entries: &[PendingEntry]) -> String {
    let mut lines = vec![row(PENDING_HEADERS)];
    for entry in entries {
        for topic in &entry.pending_topics {
            lines.push(row([
                entry.employee.name.as_str(),
                entry.employee.department.as_str(),
                topic.title.as_str(),
            ]));
        }
    }
    lines.join("\n")
}

const ATTENDANCE_HEADERS: [&str; 7] = [
    "Employee Name",
    "Department",
    "Training Date",
    "Training Topic",
    "Trainer",
    "Invited",
    "Attendance Status",
];

/// Render the date-range attendance report: one row per (invited employee,
/// schedule) for schedules dated inside `[from, to]` inclusive.
pub fn attendance_csv(snapshot: &TrainingSnapshot, from: NaiveDate, to: NaiveDate) -> String {
    let index = snapshot.index();

    let mut schedules: Vec<_> = snapshot
        .schedules
        .iter()
        .filter(|s| {
            let date = s.date.date_naive();
            date >= from && date <= to
        })
        .collect();
    schedules.sort_by_key(|s| (s.date, s.id));

    let mut employees: Vec<_> = snapshot.employees.iter().collect();
    employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let mut lines = vec![row(ATTENDANCE_HEADERS)];
    for employee in &employees {
        for schedule in &schedules {
            if !schedule.invited(employee.id) {
                continue;
            }
            let topics = schedule
                .topic_ids
                .iter()
                .filter_map(|id| index.topic(*id))
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let status = match snapshot
                .attendances
                .iter()
                .find(|a| a.schedule_id == schedule.id && a.employee_id == employee.id)
            {
                Some(a) if a.attended => "Present",
                Some(_) => "Absent",
                None => "Not Marked",
            };
            lines.push(row([
                employee.name.clone(),
                employee.department.to_string(),
                format_date(schedule.date),
                topics,
                schedule.trainer_name.clone(),
                "Yes".to_string(),
                status.to_string(),
            ]));
        }
    }
    lines.join("\n")
}

const EMPLOYEE_HEADERS: [&str; 6] = [
    "Employee Name",
    "Department",
    "Training Topic",
    "Date Completed",
    "Rating",
    "Pending Topics",
];

/// Render the employee-wise training report: one row per attended session
/// per employee, ordered by employee name then session date. The first row
/// of each employee carries the name, department and that employee's
/// pending topics ("Title (Department)" joined by "; "); continuation rows
/// leave those cells blank. An employee with no attended sessions gets a
/// single "No trainings completed" row.
///
/// Attendance rows whose schedule is missing from the snapshot are
/// skipped, matching the evaluator.
pub fn employee_csv(
    snapshot: &TrainingSnapshot,
    as_of: DateTime<Utc>,
    window: LookbackWindow,
) -> String {
    let index = snapshot.index();

    let pending: HashMap<EmployeeId, String> = pending_topics(snapshot, as_of, window)
        .into_iter()
        .map(|entry| {
            let list = entry
                .pending_topics
                .iter()
                .map(|t| format!("{} ({})", t.title, t.department))
                .collect::<Vec<_>>()
                .join("; ");
            (entry.employee.id, list)
        })
        .collect();

    let mut employees: Vec<_> = snapshot.employees.iter().collect();
    employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

    let mut lines = vec![row(EMPLOYEE_HEADERS)];
    for employee in employees {
        let mut completed: Vec<_> = snapshot
            .attendances
            .iter()
            .filter(|a| a.employee_id == employee.id && a.attended)
            .filter_map(|a| index.schedule(a.schedule_id).map(|s| (s, a.rating)))
            .collect();
        completed.sort_by_key(|(s, _)| (s.date, s.id));

        let pending_list = pending.get(&employee.id).cloned().unwrap_or_default();

        if completed.is_empty() {
            lines.push(row([
                employee.name.as_str(),
                employee.department.as_str(),
                "No trainings completed",
                "-",
                "-",
                pending_list.as_str(),
            ]));
            continue;
        }

        for (i, (schedule, rating)) in completed.iter().enumerate() {
            let topics = schedule
                .topic_ids
                .iter()
                .filter_map(|id| index.topic(*id))
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let first = i == 0;
            lines.push(row([
                if first { employee.name.clone() } else { String::new() },
                if first { employee.department.to_string() } else { String::new() },
                topics,
                format_date(schedule.date),
                rating.to_string(),
                if first { pending_list.clone() } else { String::new() },
            ]));
        }
    }
    lines.join("\n")
}

const MONTHLY_HEADERS: [&str; 9] = [
    "Month",
    "Date",
    "Training Topics",
    "Trainer",
    "Departments",
    "Total Participants",
    "Attended",
    "Attendance Rate",
    "Avg Rating",
];

/// Render the monthly summary: schedules grouped by calendar month, most
/// recent month first, with per-session attendance rate and average rating.
pub fn monthly_csv(snapshot: &TrainingSnapshot) -> String {
    let index = snapshot.index();

    // BTreeMap keyed (year, month) keeps months ordered; reversed on output.
    let mut by_month: BTreeMap<(i32, u32), Vec<&crate::snapshot::ScheduleView>> = BTreeMap::new();
    for schedule in &snapshot.schedules {
        by_month
            .entry((schedule.date.year(), schedule.date.month()))
            .or_default()
            .push(schedule);
    }

    let mut lines = vec![row(MONTHLY_HEADERS)];
    for ((year, month), mut schedules) in by_month.into_iter().rev() {
        schedules.sort_by_key(|s| (s.date, s.id));
        let label = format!("{} {year}", month_name(month));
        lines.push(row([
            label.as_str(),
            "",
            "",
            "",
            "",
            "",
            "",
            "",
            "",
        ]));

        for schedule in schedules {
            let topics: Vec<_> = schedule
                .topic_ids
                .iter()
                .filter_map(|id| index.topic(*id))
                .collect();
            let titles = topics
                .iter()
                .map(|t| t.title.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let mut departments: Vec<&str> =
                topics.iter().map(|t| t.department.as_str()).collect();
            departments.sort_unstable();
            departments.dedup();

            let attended: Vec<_> = snapshot
                .attendances
                .iter()
                .filter(|a| a.schedule_id == schedule.id && a.attended)
                .collect();
            let invited = schedule.employee_ids.len();
            let rate = if invited > 0 {
                format!("{:.0}%", attended.len() as f64 / invited as f64 * 100.0)
            } else {
                "0%".to_string()
            };
            let avg_rating = if attended.is_empty() {
                "N/A".to_string()
            } else {
                let sum: u32 = attended.iter().map(|a| u32::from(a.rating.value())).sum();
                format!("{:.1}", f64::from(sum) / attended.len() as f64)
            };

            lines.push(row([
                String::new(),
                format_date(schedule.date),
                titles,
                schedule.trainer_name.clone(),
                departments.join(", "),
                invited.to_string(),
                attended.len().to_string(),
                rate,
                avg_rating,
            ]));
        }
    }
    lines.join("\n")
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{pending_topics, LookbackWindow};
    use crate::refresher::refresher_report;
    use crate::snapshot::{AttendanceView, EmployeeView, ScheduleView, TopicView};
    use chrono::{Duration, TimeZone};
    use trt_core::{
        AttendanceId, Department, EmployeeId, Rating, Role, ScheduleId, TopicId,
    };

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn sample_snapshot() -> TrainingSnapshot {
        let employee = EmployeeView {
            id: EmployeeId::new(),
            name: "Amira \"Mia\" Khan".into(),
            department: Department::Production,
            role: Role::User,
        };
        let topic = TopicView {
            id: TopicId::new(),
            title: "Machine Guarding, Level 2".into(),
            department: Department::Production,
        };
        let schedule = ScheduleView {
            id: ScheduleId::new(),
            date: as_of() - Duration::days(10),
            topic_ids: vec![topic.id],
            employee_ids: vec![employee.id],
            trainer_name: "Tariq".into(),
        };
        let attendance = AttendanceView {
            id: AttendanceId::new(),
            schedule_id: schedule.id,
            employee_id: employee.id,
            attended: true,
            rating: Rating::new(4).unwrap(),
        };
        TrainingSnapshot {
            employees: vec![employee],
            topics: vec![topic],
            schedules: vec![schedule],
            attendances: vec![attendance],
        }
    }

    #[test]
    fn every_field_is_quoted_and_embedded_quotes_doubled() {
        assert_eq!(field("plain"), "\"plain\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(row(["a", "b,c"]), "\"a\",\"b,c\"");
    }

    #[test]
    fn date_renders_day_month_year() {
        let date = Utc.with_ymd_and_hms(2026, 3, 7, 0, 0, 0).unwrap();
        assert_eq!(format_date(date), "07/03/2026");
    }

    #[test]
    fn refresher_csv_has_expected_headers_and_never_row() {
        // No topics attended: one Initial Training Required row.
        let mut snapshot = sample_snapshot();
        snapshot.attendances.clear();
        let entries = refresher_report(&snapshot, as_of(), LookbackWindow::DEFAULT);
        let csv = refresher_csv(&entries);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "\"Employee Name\",\"Department\",\"Training Topic\",\"Last Training Date\",\"Days Since Last Training\",\"Status\",\"Priority\",\"Last Rating\""
        );
        let data = lines.next().unwrap();
        assert!(data.contains("\"Never\""));
        assert!(data.contains("\"Initial Training Required\""));
        assert!(data.contains("\"High\""));
        // Embedded quotes in the employee name survive the round trip.
        assert!(data.contains("\"Amira \"\"Mia\"\" Khan\""));
    }

    #[test]
    fn pending_csv_emits_one_row_per_pending_topic() {
        let mut snapshot = sample_snapshot();
        snapshot.attendances.clear(); // nothing attended → topic pending
        let entries = pending_topics(&snapshot, as_of(), LookbackWindow::DEFAULT);
        let csv = pending_csv(&entries);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "\"Employee\",\"Department\",\"Topic\"");
        assert!(lines[1].contains("\"Machine Guarding, Level 2\""));
    }

    #[test]
    fn attendance_csv_filters_by_date_range() {
        let snapshot = sample_snapshot();
        let from = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let csv = attendance_csv(&snapshot, from, to);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"Present\""));
        assert!(lines[1].contains("\"Yes\""));

        // Range before the session: headers only.
        let earlier = attendance_csv(
            &snapshot,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        );
        assert_eq!(earlier.lines().count(), 1);
    }

    #[test]
    fn attendance_csv_marks_absent_and_not_marked() {
        let mut snapshot = sample_snapshot();
        snapshot.attendances[0].attended = false;
        let from = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let csv = attendance_csv(&snapshot, from, to);
        assert!(csv.contains("\"Absent\""));

        snapshot.attendances.clear();
        let csv = attendance_csv(&snapshot, from, to);
        assert!(csv.contains("\"Not Marked\""));
    }

    #[test]
    fn employee_csv_lists_completed_sessions() {
        let snapshot = sample_snapshot();
        let csv = employee_csv(&snapshot, as_of(), LookbackWindow::DEFAULT);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "\"Employee Name\",\"Department\",\"Training Topic\",\"Date Completed\",\"Rating\",\"Pending Topics\""
        );
        // One attended session 10 days back: a completed row, nothing pending.
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"Machine Guarding, Level 2\""));
        assert!(lines[1].contains("\"22/05/2026\""));
        assert!(lines[1].contains("\"4\""));
    }

    #[test]
    fn employee_csv_marks_no_trainings_and_lists_pending() {
        let mut snapshot = sample_snapshot();
        snapshot.attendances.clear();
        let csv = employee_csv(&snapshot, as_of(), LookbackWindow::DEFAULT);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"No trainings completed\""));
        assert!(lines[1].contains("\"Machine Guarding, Level 2 (Production)\""));
    }

    #[test]
    fn monthly_csv_groups_and_summarizes() {
        let snapshot = sample_snapshot();
        let csv = monthly_csv(&snapshot);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // headers, month row, session row
        assert!(lines[1].starts_with("\"May 2026\""));
        assert!(lines[2].contains("\"100%\""));
        assert!(lines[2].contains("\"4.0\""));
        assert!(lines[2].contains("\"Tariq\""));
    }

    #[test]
    fn monthly_csv_handles_no_attendance() {
        let mut snapshot = sample_snapshot();
        snapshot.attendances.clear();
        let csv = monthly_csv(&snapshot);
        assert!(csv.contains("\"0%\""));
        assert!(csv.contains("\"N/A\""));
    }
}
