//! End-to-end read-line runs against the in-memory terminal.

use chordline::config::{EditMode, HistorySaveStyle, Options, PredictionView};
use chordline::core::completion::WordListCompleter;
use chordline::core::editor::ReadLineOutcome;
use chordline::core::history_file::HistoryFile;
use chordline::core::input::{KeyCode, KeyPress};
use chordline::core::session::EditorSession;
use chordline::terminal::transport::MockTerminal;

fn session(mode: EditMode) -> EditorSession {
    EditorSession::new(Options {
        edit_mode: mode,
        ..Options::default()
    })
}

fn key(code: KeyCode) -> KeyPress {
    KeyPress::new(code)
}

#[test]
fn accepted_line_leaves_cursor_at_column_zero() {
    let mut s = session(EditMode::Cmd);
    let mut term = MockTerminal::new(80, 24);
    term.push_str("exit\n");

    let outcome = s.read_line(&mut term, "PS> ").unwrap();

    assert_eq!(outcome, ReadLineOutcome::Accepted("exit".to_string()));
    assert_eq!(term.screen_lines()[0], "PS> exit");
    assert_eq!(term.cursor().0, 0);
}

#[test]
fn vi_delete_then_put() {
    let mut s = session(EditMode::Vi);
    let mut ed = s.editor("");
    for c in "abcd".chars() {
        ed.process_key(KeyPress::char(c));
    }
    ed.process_key(key(KeyCode::Esc));
    ed.process_key(KeyPress::char('x'));
    ed.process_key(KeyPress::char('p'));
    assert_eq!(ed.get_buffer_state(), ("abcd".to_string(), 3));
}

#[test]
fn vi_delete_then_put_through_terminal() {
    let mut s = session(EditMode::Vi);
    let mut term = MockTerminal::new(80, 24);
    term.push_str("abcd");
    term.push_key(key(KeyCode::Esc));
    term.push_str("xp\n");
    let outcome = s.read_line(&mut term, "$ ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("abcd".to_string()));
}

#[test]
fn emacs_kill_word_and_yank_at_end() {
    let mut s = session(EditMode::Emacs);
    let mut term = MockTerminal::new(80, 24);
    term.push_str("echo abc def");
    for _ in 0..7 {
        term.push_key(key(KeyCode::Left));
    }
    term.push_key(KeyPress::char('d').alt());
    term.push_key(key(KeyCode::End));
    term.push_key(KeyPress::char('y').ctrl());
    term.push_str("\n");

    let outcome = s.read_line(&mut term, "$ ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("echo  defabc".to_string()));
}

#[test]
fn history_up_up_down() {
    let mut s = session(EditMode::Cmd);
    s.add_to_history("ps p*");
    s.add_to_history("dir c*");

    let mut ed = s.editor("");
    ed.process_key(key(KeyCode::Up));
    assert_eq!(ed.get_buffer_state().0, "dir c*");
    ed.process_key(key(KeyCode::Up));
    assert_eq!(ed.get_buffer_state().0, "ps p*");
    ed.process_key(key(KeyCode::Down));
    assert_eq!(ed.get_buffer_state().0, "dir c*");
}

#[test]
fn accepted_lines_feed_later_calls() {
    let mut s = session(EditMode::Emacs);
    let mut term = MockTerminal::new(40, 24);
    term.push_str("first\n");
    s.read_line(&mut term, "> ").unwrap();

    term.push_key(KeyPress::char('p').ctrl());
    term.push_str("\n");
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("first".to_string()));
    // a repeat of the newest entry is not stored twice
    assert_eq!(s.history().len(), 1);
}

#[test]
fn ctrl_c_cancels_and_ctrl_d_on_empty_line_ends_input() {
    let mut s = session(EditMode::Emacs);
    let mut term = MockTerminal::new(40, 24);
    term.push_str("half typed");
    term.push_key(KeyPress::char('c').ctrl());
    assert_eq!(s.read_line(&mut term, "> ").unwrap(), ReadLineOutcome::Cancelled);

    term.push_key(KeyPress::char('d').ctrl());
    assert_eq!(s.read_line(&mut term, "> ").unwrap(), ReadLineOutcome::Eof);
}

#[test]
fn long_input_wraps_and_cursor_follows() {
    let mut s = session(EditMode::Cmd);
    let mut term = MockTerminal::new(10, 24);
    term.push_str("abcdefghijkl");
    term.push_key(key(KeyCode::Home));
    term.push_str("\n");
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("abcdefghijkl".to_string()));
    let lines = term.screen_lines();
    assert_eq!(lines[0], "> abcdefgh");
    assert_eq!(lines[1], "ijkl");
    assert_eq!(term.cursor(), (0, 2));
}

#[test]
fn wide_chars_take_two_cells() {
    let mut s = session(EditMode::Cmd);
    let mut term = MockTerminal::new(40, 24);
    term.push_str("漢字");
    let _ = s.read_line(&mut term, "> ");
    assert_eq!(term.screen_lines()[0].trim_end(), "> 漢字");
}

#[test]
fn escape_bytes_decode_to_arrow_keys() {
    let mut s = session(EditMode::Emacs);
    let mut term = MockTerminal::new(40, 24);
    term.push_str("ab");
    // ESC [ D is Left
    term.push_bytes(b"\x1b[D");
    term.push_str("X\n");
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("aXb".to_string()));
}

#[test]
fn resize_reflows_the_input() {
    let mut s = session(EditMode::Cmd);
    let mut term = MockTerminal::new(20, 24);
    term.push_str("0123456789");
    term.push_resize(8, 24);
    term.push_str("\n");
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("0123456789".to_string()));
}

#[test]
fn reverse_search_accepts_match() {
    let mut s = session(EditMode::Emacs);
    s.add_to_history("cargo build");
    s.add_to_history("ls -la");
    let mut term = MockTerminal::new(60, 24);
    term.push_key(KeyPress::char('r').ctrl());
    term.push_str("carg");
    term.push_key(key(KeyCode::Enter));
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("cargo build".to_string()));
}

#[test]
fn tab_completion_through_terminal() {
    let mut s = session(EditMode::Emacs);
    s.set_completer(Box::new(WordListCompleter::new(["status", "stash"])));
    let mut term = MockTerminal::new(60, 24);
    term.push_str("git stat");
    term.push_key(key(KeyCode::Tab));
    term.push_str("\n");
    let outcome = s.read_line(&mut term, "> ").unwrap();
    assert_eq!(outcome, ReadLineOutcome::Accepted("git status".to_string()));
}

#[test]
fn list_view_draws_rows_below_input() {
    let mut s = EditorSession::new(Options {
        edit_mode: EditMode::Emacs,
        prediction_view: PredictionView::List,
        ..Options::default()
    });
    s.add_to_history("git status");
    s.add_to_history("git stash");
    let mut ed = s.editor("> ");
    ed.insert("git st");
    let lines = ed.frame(40).lines();
    assert_eq!(lines[0].trim_end(), "> git st");
    assert!(lines.iter().any(|l| l.starts_with("> git stash")), "{:?}", lines);
    assert!(lines.iter().any(|l| l.starts_with("> git status")), "{:?}", lines);
}

#[test]
fn history_file_survives_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history");

    let mut s = session(EditMode::Cmd);
    s.set_history_file(HistoryFile::new(&path, HistorySaveStyle::Incremental))
        .unwrap();
    let mut term = MockTerminal::new(40, 24);
    term.push_str("make\n");
    s.read_line(&mut term, "> ").unwrap();
    s.end_session().unwrap();

    let mut s = session(EditMode::Cmd);
    let loaded = s
        .set_history_file(HistoryFile::new(&path, HistorySaveStyle::Incremental))
        .unwrap();
    assert_eq!(loaded, 1);
    let mut term = MockTerminal::new(40, 24);
    term.push_key(key(KeyCode::Up));
    term.push_str("\n");
    assert_eq!(
        s.read_line(&mut term, "> ").unwrap(),
        ReadLineOutcome::Accepted("make".to_string())
    );
}
