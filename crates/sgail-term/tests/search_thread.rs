//! Searcher thread integration tests.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sgail_term::{SearchEvent, Searcher, Terminal, TerminalOptions};

fn shared_terminal(lines: &[&str]) -> Arc<Mutex<Terminal>> {
    let mut terminal = Terminal::new(TerminalOptions {
        cols: 40,
        rows: 8,
        max_scrollback: 1000,
    });
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let _ = terminal.linefeed();
            terminal.carriage_return();
        }
        for c in line.chars() {
            let _ = terminal.print(c);
        }
    }
    Arc::new(Mutex::new(terminal))
}

/// Collect events until `Complete` and a stable total arrive, or time out.
fn run_search(terminal: &Arc<Mutex<Terminal>>, needle: &str) -> (bool, Option<usize>) {
    let (tx, rx) = mpsc::channel();
    let searcher = Searcher::spawn(Arc::clone(terminal), move |event| {
        let _ = tx.send(event);
    });
    searcher.change_needle(needle);

    let mut complete = false;
    let mut total = None;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(SearchEvent::Complete) => complete = true,
            Ok(SearchEvent::TotalMatches(n)) => total = Some(n),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if complete && total.is_some() {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    searcher.stop();
    (complete, total)
}

#[test]
fn finds_matches_and_completes() {
    let terminal = shared_terminal(&["alpha beta", "beta beta", "gamma"]);
    let (complete, total) = run_search(&terminal, "beta");
    assert!(complete);
    assert_eq!(total, Some(3));
}

#[test]
fn no_matches_reports_zero() {
    let terminal = shared_terminal(&["nothing to see"]);
    let (complete, total) = run_search(&terminal, "absent");
    assert!(complete);
    assert_eq!(total, Some(0));
}

#[test]
fn needle_change_restarts() {
    let terminal = shared_terminal(&["one two two"]);
    let (tx, rx) = mpsc::channel();
    let searcher = Searcher::spawn(Arc::clone(&terminal), move |event| {
        let _ = tx.send(event);
    });

    searcher.change_needle("one");
    let mut saw_one = false;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline && !saw_one {
        if let Ok(SearchEvent::TotalMatches(1)) = rx.recv_timeout(Duration::from_millis(100)) {
            saw_one = true;
        }
    }
    assert!(saw_one);

    searcher.change_needle("two");
    let mut saw_two = false;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline && !saw_two {
        if let Ok(SearchEvent::TotalMatches(2)) = rx.recv_timeout(Duration::from_millis(100)) {
            saw_two = true;
        }
    }
    assert!(saw_two);
    searcher.stop();
}

#[test]
fn empty_needle_goes_idle() {
    let terminal = shared_terminal(&["content"]);
    let (tx, rx) = mpsc::channel();
    let searcher = Searcher::spawn(Arc::clone(&terminal), move |event| {
        let _ = tx.send(event);
    });
    searcher.change_needle("");
    // No events should arrive for an empty needle.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    // The terminal lock is free for writers the whole time.
    {
        let mut guard = match terminal.lock() {
            Ok(g) => g,
            Err(_) => unreachable!(),
        };
        for c in "still writable".chars() {
            let _ = guard.print(c);
        }
    }
    searcher.stop();
}

#[test]
fn stop_joins_cleanly() {
    let terminal = shared_terminal(&["x"]);
    let searcher = Searcher::spawn(Arc::clone(&terminal), |_| {});
    searcher.change_needle("x");
    searcher.stop();
    // The terminal is still usable after the thread exits.
    let mut guard = match terminal.lock() {
        Ok(g) => g,
        Err(_) => unreachable!(),
    };
    assert!(guard.print('y').is_ok());
}

#[test]
fn wake_is_nonblocking() {
    let terminal = shared_terminal(&["text"]);
    let searcher = Searcher::spawn(Arc::clone(&terminal), |_| {});
    for _ in 0..200 {
        searcher.wake();
    }
    searcher.stop();
}
