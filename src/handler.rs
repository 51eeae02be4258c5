use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{AnalysisPane, App, AuthField, InputMode, QaPane, Screen};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key)?,
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Auth(result) => app.on_auth(result),
        AppEvent::Uploaded { gen, result } => app.on_uploaded(gen, result),
        AppEvent::Analyzed { gen, result } => app.on_analyzed(gen, result),
        AppEvent::Reply { scope, epoch, user_id, result } => {
            app.on_reply(scope, epoch, user_id, result)
        }
        AppEvent::Transcript { gen, result } => app.on_transcript(gen, result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    // Popups swallow input while open
    if app.show_language_picker {
        handle_language_picker(app, key);
        return Ok(());
    }
    if app.show_state_picker {
        handle_state_picker(app, key);
        return Ok(());
    }

    // Everything routes to the auth form until a session exists
    if app.session.is_none() {
        handle_auth_key(app, key);
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key)?,
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_language_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_language_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.language_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.language_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(i) = app.language_picker_state.selected() {
                app.apply_language_choice(i);
            }
        }
        _ => {}
    }
}

fn handle_state_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.show_state_picker = false,
        KeyCode::Char('j') | KeyCode::Down => app.state_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.state_picker_nav_up(),
        KeyCode::Enter => {
            if let Some(i) = app.state_picker_state.selected() {
                app.apply_state_choice(i);
            }
        }
        _ => {}
    }
}

fn handle_auth_key(app: &mut App, key: KeyEvent) {
    // The form is locked while a submission is in flight
    if app.auth_pending {
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if !app.dismiss_toast() {
                app.should_quit = true;
            }
        }
        KeyCode::Tab | KeyCode::Down => app.auth_next_field(),
        KeyCode::BackTab | KeyCode::Up => app.auth_prev_field(),
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.toggle_auth_mode();
        }
        KeyCode::Enter => match app.auth_field {
            AuthField::Language => app.open_language_picker(),
            AuthField::State => app.open_state_picker(),
            _ => app.submit_auth(),
        },
        KeyCode::Char(' ') if app.auth_field == AuthField::Terms => {
            app.auth_terms = !app.auth_terms;
        }
        KeyCode::Backspace => {
            if app.auth_cursor > 0 {
                let cursor = app.auth_cursor - 1;
                if let Some(field) = app.auth_field_value_mut() {
                    let byte_pos = char_to_byte_index(field, cursor);
                    field.remove(byte_pos);
                    app.auth_cursor = cursor;
                }
            }
        }
        KeyCode::Delete => {
            let cursor = app.auth_cursor;
            if let Some(field) = app.auth_field_value_mut() {
                if cursor < field.chars().count() {
                    let byte_pos = char_to_byte_index(field, cursor);
                    field.remove(byte_pos);
                }
            }
        }
        KeyCode::Left => app.auth_cursor = app.auth_cursor.saturating_sub(1),
        KeyCode::Right => {
            let char_count = app.auth_field_value().chars().count();
            app.auth_cursor = (app.auth_cursor + 1).min(char_count);
        }
        KeyCode::Home => app.auth_cursor = 0,
        KeyCode::End => app.auth_cursor = app.auth_field_value().chars().count(),
        KeyCode::Char(c) => {
            if app.auth_field.is_text() {
                let cursor = app.auth_cursor;
                if let Some(field) = app.auth_field_value_mut() {
                    let byte_pos = char_to_byte_index(field, cursor);
                    field.insert(byte_pos, c);
                    app.auth_cursor = cursor + 1;
                }
            }
        }
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match app.screen {
        Screen::Home => handle_home_normal(app, key),
        Screen::Upload => handle_upload_normal(app, key)?,
        Screen::Qa => handle_qa_normal(app, key),
        Screen::Analysis => handle_analysis_normal(app, key),
    }
    Ok(())
}

fn handle_home_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => {
            app.dismiss_toast();
        }

        // Two cards, so any direction toggles
        KeyCode::Tab
        | KeyCode::Char('h')
        | KeyCode::Char('l')
        | KeyCode::Char('j')
        | KeyCode::Char('k')
        | KeyCode::Left
        | KeyCode::Right
        | KeyCode::Down
        | KeyCode::Up => app.home_next_card(),

        KeyCode::Enter => app.activate_home_card(),

        // Direct shortcuts
        KeyCode::Char('u') => app.go_upload(),
        KeyCode::Char('a') => app.go_qa(),
        KeyCode::Char('L') => app.logout(),

        _ => {}
    }
}

fn handle_upload_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    if app.uploading {
        // Esc cancels the transfer; everything else waits
        if key.code == KeyCode::Esc {
            app.cancel_upload();
        }
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => {
            if !app.dismiss_toast() {
                app.back_from_upload();
            }
        }

        // Browser navigation
        KeyCode::Char('j') | KeyCode::Down => app.browser_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.browser_nav_up(),
        KeyCode::Char('g') => app.browser_nav_first(),
        KeyCode::Char('G') => app.browser_nav_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.choose_entry()?,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => {
            app.browser_ascend()?;
        }

        // Selected file actions
        KeyCode::Char('a') => app.start_upload(),
        KeyCode::Char('r') => app.remove_pending_file(),

        _ => {}
    }
    Ok(())
}

fn handle_qa_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            if !app.dismiss_toast() {
                app.go_home();
            }
        }

        // Tab toggles between the chat log and the common questions list
        KeyCode::Tab => {
            app.qa_pane = match app.qa_pane {
                QaPane::Chat => {
                    if app.question_state.selected().is_none() {
                        app.question_state.select(Some(0));
                    }
                    QaPane::Questions
                }
                QaPane::Questions => QaPane::Chat,
            };
        }

        KeyCode::Char('j') | KeyCode::Down => match app.qa_pane {
            QaPane::Chat => app.qa_scroll_down(),
            QaPane::Questions => app.question_nav_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.qa_pane {
            QaPane::Chat => app.qa_scroll_up(),
            QaPane::Questions => app.question_nav_up(),
        },
        KeyCode::Char('g') => {
            if app.qa_pane == QaPane::Chat {
                app.qa_scroll = 0;
            }
        }
        KeyCode::Char('G') => {
            if app.qa_pane == QaPane::Chat {
                app.scroll_qa_to_bottom();
            }
        }

        KeyCode::Enter => {
            if app.qa_pane == QaPane::Questions {
                app.use_selected_question();
            } else {
                app.input_mode = InputMode::Editing;
            }
        }

        // Edit the draft
        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.qa_pane = QaPane::Chat;
            app.input_mode = InputMode::Editing;
        }

        // Voice capture
        KeyCode::Char('v') => app.toggle_voice(),

        _ => {}
    }
}

fn handle_analysis_normal(app: &mut App, key: KeyEvent) {
    if app.analyzing {
        // Waiting screen; Esc abandons the analysis
        if key.code == KeyCode::Esc {
            if !app.dismiss_toast() {
                app.go_home();
            }
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if !app.dismiss_toast() {
                app.go_home();
            }
        }

        // Tab cycles: Clauses -> Guidance -> Chat -> Clauses
        KeyCode::Tab => app.next_analysis_pane(),

        KeyCode::Char('i') | KeyCode::Char('/') => {
            app.analysis_pane = AnalysisPane::Chat;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('j') | KeyCode::Down => match app.analysis_pane {
            AnalysisPane::Clauses => app.clause_nav_down(),
            AnalysisPane::Guidance => {}
            AnalysisPane::Chat => app.doc_chat_scroll_down(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.analysis_pane {
            AnalysisPane::Clauses => app.clause_nav_up(),
            AnalysisPane::Guidance => {}
            AnalysisPane::Chat => app.doc_chat_scroll_up(),
        },

        KeyCode::Enter => {
            if app.analysis_pane == AnalysisPane::Clauses {
                if let Some(i) = app.clause_state.selected() {
                    app.select_clause(i);
                }
            }
        }

        // Guidance tabs
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Char('l') | KeyCode::Right => {
            if app.analysis_pane == AnalysisPane::Guidance {
                app.toggle_guidance_tab();
            }
        }

        KeyCode::Char('T') => app.open_language_picker(),
        KeyCode::Char('u') => app.go_upload(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Qa => handle_qa_editing(app, key),
        Screen::Analysis => handle_doc_chat_editing(app, key),
        _ => app.input_mode = InputMode::Normal,
    }
}

fn handle_qa_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_qa(),
        KeyCode::Tab => {
            // Jump straight to the question list
            app.input_mode = InputMode::Normal;
            app.qa_pane = QaPane::Questions;
            if app.question_state.selected().is_none() {
                app.question_state.select(Some(0));
            }
        }
        KeyCode::Backspace => {
            if app.qa_cursor > 0 {
                app.qa_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.qa_input, app.qa_cursor);
                app.qa_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.qa_input.chars().count();
            if app.qa_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.qa_input, app.qa_cursor);
                app.qa_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.qa_cursor = app.qa_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.qa_input.chars().count();
            app.qa_cursor = (app.qa_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.qa_cursor = 0;
        }
        KeyCode::End => {
            app.qa_cursor = app.qa_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.qa_input, app.qa_cursor);
            app.qa_input.insert(byte_pos, c);
            app.qa_cursor += 1;
        }
        _ => {}
    }
}

fn handle_doc_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_doc_chat(),
        KeyCode::Tab => app.next_analysis_pane(),
        KeyCode::Backspace => {
            if app.doc_cursor > 0 {
                app.doc_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.doc_input, app.doc_cursor);
                app.doc_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.doc_input.chars().count();
            if app.doc_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.doc_input, app.doc_cursor);
                app.doc_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.doc_cursor = app.doc_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.doc_input.chars().count();
            app.doc_cursor = (app.doc_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.doc_cursor = 0;
        }
        KeyCode::End => {
            app.doc_cursor = app.doc_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.doc_input, app.doc_cursor);
            app.doc_input.insert(byte_pos, c);
            app.doc_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Determine which area the mouse is in (position-based scrolling)
    let in_browser = app.browser_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_clauses = app.clause_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_doc_chat = app.doc_chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_qa_chat = app.qa_chat_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);
    let in_questions = app.question_area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => match app.screen {
            Screen::Upload => {
                if in_browser {
                    app.browser_nav_down();
                }
            }
            Screen::Analysis => {
                if in_clauses {
                    app.clause_nav_down();
                } else if in_doc_chat {
                    app.doc_chat_scroll_down();
                }
            }
            Screen::Qa => {
                if in_qa_chat {
                    app.qa_scroll_down();
                    app.qa_scroll_down();
                    app.qa_scroll_down();
                } else if in_questions {
                    app.question_nav_down();
                }
            }
            Screen::Home => {}
        },
        MouseEventKind::ScrollUp => match app.screen {
            Screen::Upload => {
                if in_browser {
                    app.browser_nav_up();
                }
            }
            Screen::Analysis => {
                if in_clauses {
                    app.clause_nav_up();
                } else if in_doc_chat {
                    app.doc_chat_scroll_up();
                }
            }
            Screen::Qa => {
                if in_qa_chat {
                    app.qa_scroll_up();
                    app.qa_scroll_up();
                    app.qa_scroll_up();
                } else if in_questions {
                    app.question_nav_up();
                }
            }
            Screen::Home => {}
        },
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::profile::{AuthMode, Language, UserProfile};
    use crate::services::Services;
    use tokio::sync::mpsc;

    fn test_app() -> (App, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        config.start_dir = Some(tmp.path().to_string_lossy().into_owned());
        let app = App::new(config, Services::simulated_instant(), tx).unwrap();
        (app, tmp)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_lands_in_the_focused_auth_field() {
        let (mut app, _tmp) = test_app();
        for c in "987".chars() {
            handle_key(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        assert_eq!(app.auth_phone, "987");
        assert_eq!(app.auth_cursor, 3);

        handle_key(&mut app, press(KeyCode::Backspace)).unwrap();
        assert_eq!(app.auth_phone, "98");

        handle_key(&mut app, press(KeyCode::Tab)).unwrap();
        assert_eq!(app.auth_field, AuthField::Password);
        handle_key(&mut app, press(KeyCode::Char('s'))).unwrap();
        assert_eq!(app.auth_password, "s");
        assert_eq!(app.auth_phone, "98");
    }

    #[test]
    fn ctrl_t_switches_to_sign_up() {
        let (mut app, _tmp) = test_app();
        let key = KeyEvent::new(KeyCode::Char('t'), KeyModifiers::CONTROL);
        handle_key(&mut app, key).unwrap();
        assert_eq!(app.auth_mode, AuthMode::SignUp);
        assert_eq!(app.auth_field, AuthField::Name);
    }

    #[test]
    fn ctrl_c_quits_from_anywhere() {
        let (mut app, _tmp) = test_app();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        handle_key(&mut app, key).unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn quick_keys_route_from_home() {
        let (mut app, _tmp) = test_app();
        app.session = Some(UserProfile {
            name: Some("Priya".to_string()),
            phone: "9876543210".to_string(),
            email: None,
            preferred_language: Language::En,
            state: None,
        });

        handle_key(&mut app, press(KeyCode::Char('u'))).unwrap();
        assert_eq!(app.screen, Screen::Upload);

        handle_key(&mut app, press(KeyCode::Esc)).unwrap();
        assert_eq!(app.screen, Screen::Home);
    }

    #[test]
    fn editing_mode_keeps_q_and_slash_as_text() {
        let (mut app, _tmp) = test_app();
        app.session = Some(UserProfile {
            name: None,
            phone: "9876543210".to_string(),
            email: None,
            preferred_language: Language::En,
            state: None,
        });
        app.screen = Screen::Qa;
        app.input_mode = InputMode::Editing;

        for c in "q/".chars() {
            handle_key(&mut app, press(KeyCode::Char(c))).unwrap();
        }
        assert!(!app.should_quit);
        assert_eq!(app.qa_input, "q/");
    }
}
