use std::fs;
use std::io::Cursor;

use chrono::{Duration, Utc};
use tasklist_core::board::Board;
use tasklist_core::config::Config;
use tasklist_core::filter::FilterCriteria;
use tasklist_core::render::Renderer;
use tasklist_core::reorder::ReorderOutcome;
use tasklist_core::sort::SortKey;
use tasklist_core::task::{Category, Priority};
use tasklist_core::validate::TaskInput;
use tasklist_core::{OnError, SessionReport, run_session};
use tempfile::tempdir;

fn input(title: &str, category: Category, priority: Priority, days: i64) -> TaskInput {
    TaskInput {
        title: title.to_string(),
        description: None,
        category,
        priority,
        due_date: Some(Utc::now() + Duration::days(days)),
    }
}

fn titles(board: &Board) -> Vec<String> {
    board
        .store()
        .as_slice()
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

#[test]
fn board_ranks_hidden_tasks_by_original_index_while_dragging() {
    let now = Utc::now();
    let mut board = Board::default();
    for (title, category) in [
        ("Book dentist", Category::Personal),
        ("Quarterly report", Category::Professional),
        ("Buy groceries", Category::Personal),
        ("Team retro", Category::Professional),
    ] {
        board
            .create_task(input(title, category, Priority::Medium, 3), now)
            .expect("valid task");
    }
    assert_eq!(
        titles(&board),
        vec!["Team retro", "Buy groceries", "Quarterly report", "Book dentist"]
    );

    board.set_filters(FilterCriteria::new(None, Some(Category::Professional), None));
    let outcome = board.reorder(1, Some(0));
    assert!(outcome.is_applied());

    assert_eq!(
        titles(&board),
        vec!["Quarterly report", "Team retro", "Buy groceries", "Book dentist"]
    );
}

#[test]
fn dragging_a_sorted_view_switches_to_manual_order() {
    let now = Utc::now();
    let mut board = Board::new(Some(SortKey::Priority));
    board
        .create_task(input("Low thing", Category::Other, Priority::Low, 5), now)
        .expect("valid task");
    board
        .create_task(input("High thing", Category::Other, Priority::High, 5), now)
        .expect("valid task");
    board
        .create_task(input("Mid thing", Category::Other, Priority::Medium, 5), now)
        .expect("valid task");

    let shown: Vec<_> = board
        .projected_view()
        .iter()
        .map(|t| t.title.clone())
        .collect();
    assert_eq!(shown, vec!["High thing", "Mid thing", "Low thing"]);

    assert_eq!(board.reorder(2, None), ReorderOutcome::Cancelled);
    assert_eq!(board.sort_key(), Some(SortKey::Priority));

    assert!(board.reorder(2, Some(0)).is_applied());
    assert_eq!(board.sort_key(), None);
    assert_eq!(titles(&board), vec!["Low thing", "High thing", "Mid thing"]);
}

#[test]
fn scripted_session_runs_with_rc_file() {
    let dir = tempdir().expect("tempdir");
    let rc = dir.path().join("tasklistrc");
    fs::write(&rc, "default.sort = due\ncolor = off\n").expect("write rc");

    let cfg = Config::load(Some(&rc)).expect("load rc");
    let mut board = Board::new(cfg.default_sort().expect("sort key"));
    let renderer = Renderer::plain(cfg.urgent_days().expect("urgent days"), chrono_tz::UTC);

    let script = "\
# weekly planning
add Pay rent cat:perso pri:high due:+2d
add Prepare demo cat:pro due:+5d desc:\"slides and notes\"
add no
ad Call plumber pri:low due:+1d
done 2
sort created
list
frobnicate
";
    let mut out = Vec::new();
    let report = run_session(
        &mut board,
        &cfg,
        &renderer,
        chrono_tz::UTC,
        Cursor::new(script),
        &mut out,
        OnError::Continue,
    )
    .expect("session io");

    assert_eq!(
        report,
        SessionReport {
            executed: 8,
            failed: 2
        }
    );
    assert_eq!(board.store().len(), 3);
    assert_eq!(board.stats().completed, 1);

    let pay_rent = board
        .store()
        .as_slice()
        .iter()
        .find(|t| t.title == "Pay rent")
        .expect("pay rent stored");
    assert!(pay_rent.completed);

    let text = String::from_utf8(out).expect("utf8 output");
    assert!(text.contains("title: title must contain at least 3 characters"));
    assert!(text.contains("due_date: due date is required"));
    assert!(text.contains("1 of 3 tasks completed"));
    assert!(text.contains("sort: created"));
}

#[test]
fn fail_fast_stops_at_first_error() {
    let cfg = Config::default();
    let mut board = Board::default();
    let renderer = Renderer::plain(2, chrono_tz::UTC);
    let mut out = Vec::new();

    let report = run_session(
        &mut board,
        &cfg,
        &renderer,
        chrono_tz::UTC,
        Cursor::new("delete 1\nadd Never runs due:+1d\n"),
        &mut out,
        OnError::Stop,
    )
    .expect("session io");

    assert_eq!(report.failed, 1);
    assert!(board.store().is_empty());
}
