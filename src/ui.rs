use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};
use crate::analysis::{ANALYZING_STAGES, RiskCategory, RiskLevel};
use crate::app::{AnalysisPane, App, AuthField, GuidanceTab, InputMode, QaPane, Screen, ToastKind};
use crate::assistant::{COMMON_QUESTIONS, ChatRole, ChatSession, VoiceState};
use crate::document::format_size;
use crate::profile::{AuthMode, INDIAN_STATES, Language};

fn category_color(category: RiskCategory) -> Color {
    match category {
        RiskCategory::Safe => Color::Green,
        RiskCategory::Warning => Color::Yellow,
        RiskCategory::Risk => Color::Red,
        RiskCategory::Neutral => Color::Blue,
    }
}

fn risk_color(risk: RiskLevel) -> Color {
    match risk {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

/// Greedy word wrap for list items; `List` does no wrapping of its own.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Chat transcript as styled lines: a role line per message, the content
/// underneath, and a thinking indicator while a reply is in flight.
fn chat_lines(session: &ChatSession, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in session.messages() {
        let (who, who_color) = match msg.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::styled(who, Style::default().fg(who_color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", msg.timestamp.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

        let content_style = match msg.category {
            Some(category) => Style::default().fg(category_color(category)),
            None => Style::default(),
        };
        for line in msg.content.lines() {
            lines.push(Line::from(Span::styled(line.to_string(), content_style)));
        }
        lines.push(Line::default());
    }

    if session.pending() > 0 {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    // Hit-test areas are refilled by whichever screen draws this frame
    app.browser_area = None;
    app.clause_area = None;
    app.doc_chat_area = None;
    app.qa_chat_area = None;
    app.question_area = None;

    if app.session.is_none() {
        render_auth(app, frame, body_area);
    } else {
        match app.screen {
            Screen::Home => render_home(app, frame, body_area),
            Screen::Upload => render_upload(app, frame, body_area),
            Screen::Qa => render_qa(app, frame, body_area),
            Screen::Analysis => render_analysis(app, frame, body_area),
        }
    }

    render_footer(app, frame, footer_area);

    // Render popups (in order of priority)
    if app.show_language_picker {
        render_language_picker(app, frame, area);
    } else if app.show_state_picker {
        render_state_picker(app, frame, area);
    }

    render_toasts(app, frame, area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Nyaya ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "Indian Legal Document Assistant ",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("[{}] ", app.language.code().to_uppercase()),
            Style::default().fg(Color::Black),
        ),
    ];
    if let Some(profile) = &app.session {
        spans.push(Span::styled(
            format!("{} ", profile.display_name()),
            Style::default().fg(Color::White).bold(),
        ));
    }
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::Black),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = if app.session.is_none() {
        match app.auth_mode {
            AuthMode::SignIn => " SIGN IN ",
            AuthMode::SignUp => " SIGN UP ",
        }
    } else {
        match app.screen {
            Screen::Home => " HOME ",
            Screen::Upload => " UPLOAD ",
            Screen::Qa => " Q&A ",
            Screen::Analysis => " ANALYSIS ",
        }
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.session.is_none() {
        let mut hints = vec![
            Span::styled(" Tab ", key_style),
            Span::styled(" next field ", label_style),
            Span::styled(" Ctrl+T ", key_style),
            Span::styled(
                match app.auth_mode {
                    AuthMode::SignIn => " sign up ",
                    AuthMode::SignUp => " sign in ",
                },
                label_style,
            ),
        ];
        match app.auth_field {
            AuthField::Language | AuthField::State => hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" choose ", label_style),
            ]),
            AuthField::Terms => hints.extend(vec![
                Span::styled(" Space ", key_style),
                Span::styled(" toggle ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" submit ", label_style),
            ]),
            _ => hints.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" submit ", label_style),
            ]),
        }
        hints.extend(vec![
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]);
        hints
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Home, _) => vec![
                Span::styled(" Tab ", key_style),
                Span::styled(" switch ", label_style),
                Span::styled(" Enter ", key_style),
                Span::styled(" open ", label_style),
                Span::styled(" u ", key_style),
                Span::styled(" upload ", label_style),
                Span::styled(" a ", key_style),
                Span::styled(" ask AI ", label_style),
                Span::styled(" L ", key_style),
                Span::styled(" logout ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Upload, _) => {
                if app.uploading {
                    vec![
                        Span::styled(" Esc ", key_style),
                        Span::styled(" cancel ", label_style),
                    ]
                } else {
                    let mut hints = vec![
                        Span::styled(" j/k ", key_style),
                        Span::styled(" nav ", label_style),
                        Span::styled(" Enter ", key_style),
                        Span::styled(" select ", label_style),
                        Span::styled(" h ", key_style),
                        Span::styled(" parent ", label_style),
                    ];
                    if app.pending_file.is_some() {
                        hints.extend(vec![
                            Span::styled(" a ", key_style),
                            Span::styled(" analyze ", label_style),
                            Span::styled(" r ", key_style),
                            Span::styled(" remove ", label_style),
                        ]);
                    }
                    hints.extend(vec![
                        Span::styled(" Esc ", key_style),
                        Span::styled(" back ", label_style),
                    ]);
                    hints
                }
            }
            (Screen::Qa, InputMode::Normal) => {
                let mut hints = vec![
                    Span::styled(" Tab ", key_style),
                    Span::styled(
                        if app.qa_pane == QaPane::Chat { " questions " } else { " chat " },
                        label_style,
                    ),
                    Span::styled(" j/k ", key_style),
                    Span::styled(
                        if app.qa_pane == QaPane::Chat { " scroll " } else { " nav " },
                        label_style,
                    ),
                ];
                if app.qa_pane == QaPane::Questions {
                    hints.extend(vec![
                        Span::styled(" Enter ", key_style),
                        Span::styled(" ask ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                    Span::styled(" v ", key_style),
                    Span::styled(" voice ", label_style),
                    Span::styled(" Esc ", key_style),
                    Span::styled(" home ", label_style),
                ]);
                hints
            }
            (Screen::Qa, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" questions ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            (Screen::Analysis, InputMode::Normal) => {
                if app.analyzing {
                    vec![
                        Span::styled(" Esc ", key_style),
                        Span::styled(" cancel ", label_style),
                    ]
                } else {
                    let mut hints = vec![
                        Span::styled(" Tab ", key_style),
                        Span::styled(" pane ", label_style),
                    ];
                    match app.analysis_pane {
                        AnalysisPane::Clauses => hints.extend(vec![
                            Span::styled(" j/k ", key_style),
                            Span::styled(" nav ", label_style),
                            Span::styled(" Enter ", key_style),
                            Span::styled(" details ", label_style),
                        ]),
                        AnalysisPane::Guidance => hints.extend(vec![
                            Span::styled(" h/l ", key_style),
                            Span::styled(" tabs ", label_style),
                        ]),
                        AnalysisPane::Chat => hints.extend(vec![
                            Span::styled(" j/k ", key_style),
                            Span::styled(" scroll ", label_style),
                        ]),
                    }
                    hints.extend(vec![
                        Span::styled(" i ", key_style),
                        Span::styled(" chat ", label_style),
                        Span::styled(" T ", key_style),
                        Span::styled(" language ", label_style),
                        Span::styled(" u ", key_style),
                        Span::styled(" new upload ", label_style),
                        Span::styled(" Esc ", key_style),
                        Span::styled(" home ", label_style),
                    ]);
                    hints
                }
            }
            (Screen::Analysis, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" pane ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_auth(app: &App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    let popup_width = 64.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(2) as usize;
    let value_width = inner_width.saturating_sub(2);

    let focused_label = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let dim_label = Style::default().fg(Color::DarkGray);
    let active_tab = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let inactive_tab = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line> = Vec::new();
    // Line and column of the focused text field, for cursor placement
    let mut cursor: Option<(usize, usize)> = None;

    lines.push(Line::from(Span::styled(
        "Access AI-powered legal document analysis",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::default());

    let (signin_style, signup_style) = match app.auth_mode {
        AuthMode::SignIn => (active_tab, inactive_tab),
        AuthMode::SignUp => (inactive_tab, active_tab),
    };
    lines.push(Line::from(vec![
        Span::styled(" Sign In ", signin_style),
        Span::raw("  "),
        Span::styled(" Sign Up ", signup_style),
    ]));
    lines.push(Line::default());

    let mut push_text_field =
        |field: AuthField, label: &'static str, value: &str, placeholder: &'static str, mask: bool| {
            let focused = app.auth_field == field;
            lines.push(Line::from(Span::styled(
                label,
                if focused { focused_label } else { dim_label },
            )));

            let shown = if mask {
                "*".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            // Keep the cursor inside the visible slice of long values
            let offset = if focused && value_width > 0 && app.auth_cursor >= value_width {
                app.auth_cursor - value_width + 1
            } else {
                0
            };

            let prefix = if focused {
                Span::styled("> ", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("  ")
            };
            let value_span = if shown.is_empty() {
                Span::styled(placeholder, Style::default().fg(Color::DarkGray))
            } else {
                let visible: String = shown.chars().skip(offset).take(value_width).collect();
                Span::styled(visible, Style::default().fg(Color::Cyan))
            };
            if focused {
                cursor = Some((lines.len(), 2 + (app.auth_cursor - offset)));
            }
            lines.push(Line::from(vec![prefix, value_span]));
            lines.push(Line::default());
        };

    match app.auth_mode {
        AuthMode::SignIn => {
            push_text_field(AuthField::Phone, "Phone Number", &app.auth_phone, "+91 98765 43210", false);
            push_text_field(AuthField::Password, "Password", &app.auth_password, "", true);
        }
        AuthMode::SignUp => {
            push_text_field(AuthField::Name, "Full Name", &app.auth_name, "Enter your full name", false);
            push_text_field(AuthField::Email, "Email Address", &app.auth_email, "your.email@example.com", false);
            push_text_field(AuthField::Phone, "Phone Number", &app.auth_phone, "+91 98765 43210", false);
            push_text_field(AuthField::Password, "Create Password", &app.auth_password, "", true);
        }
    }

    if app.auth_mode == AuthMode::SignUp {
        let focused = app.auth_field == AuthField::Language;
        lines.push(Line::from(Span::styled(
            "Preferred Language",
            if focused { focused_label } else { dim_label },
        )));
        lines.push(Line::from(vec![
            if focused {
                Span::styled("> ", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("  ")
            },
            Span::styled(app.auth_language.display_name(), Style::default().fg(Color::Cyan)),
        ]));
        lines.push(Line::default());

        let focused = app.auth_field == AuthField::State;
        lines.push(Line::from(Span::styled(
            "State / UT",
            if focused { focused_label } else { dim_label },
        )));
        let state_span = match app.auth_state_idx {
            Some(i) => Span::styled(INDIAN_STATES[i], Style::default().fg(Color::Cyan)),
            None => Span::styled("Select your state", Style::default().fg(Color::DarkGray)),
        };
        lines.push(Line::from(vec![
            if focused {
                Span::styled("> ", Style::default().fg(Color::Yellow))
            } else {
                Span::raw("  ")
            },
            state_span,
        ]));
        lines.push(Line::default());
    }

    let focused = app.auth_field == AuthField::Terms;
    let mark = if app.auth_terms { "[x]" } else { "[ ]" };
    lines.push(Line::from(vec![
        if focused {
            Span::styled("> ", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("  ")
        },
        Span::styled(
            format!("{} I agree to the Terms of Service and Privacy Policy", mark),
            if focused { focused_label } else { Style::default() },
        ),
    ]));
    lines.push(Line::default());

    if app.auth_pending {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Processing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    } else {
        let submit = match app.auth_mode {
            AuthMode::SignIn => " Sign In ",
            AuthMode::SignUp => " Create Account ",
        };
        lines.push(Line::from(vec![
            Span::styled(
                submit,
                Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Enter to submit", Style::default().fg(Color::DarkGray)),
        ]));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Encrypted   Multi-language",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Your data is encrypted and secure. This platform provides",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "AI-powered legal assistance but does not constitute",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "legal advice.",
        Style::default().fg(Color::DarkGray),
    )));

    let popup_height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Get Started ");
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);

    if let Some((line_idx, col)) = cursor {
        if !app.auth_pending && (line_idx as u16) < popup_height.saturating_sub(2) {
            frame.set_cursor_position((
                popup_area.x + 1 + col as u16,
                popup_area.y + 1 + line_idx as u16,
            ));
        }
    }
}

fn render_home(app: &App, frame: &mut Frame, area: Rect) {
    let [welcome_area, cards_area, features_area, disclaimer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(9),
        Constraint::Min(0),
        Constraint::Length(6),
    ])
    .areas(area);

    let first_name = match &app.session {
        Some(profile) => profile.first_name(),
        None => "User",
    };
    let welcome = Paragraph::new(vec![
        Line::default(),
        Line::from(Span::styled(
            format!("Welcome back, {}!", first_name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Get AI-powered assistance for your legal documents and questions.",
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(welcome, welcome_area);

    let [upload_area, qa_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(cards_area);

    render_home_card(
        frame,
        upload_area,
        app.home_card == 0,
        " Document Analysis ",
        "Upload and analyze legal documents",
        "Upload your legal documents (PDF, JPG) to get instant analysis, risk assessment, \
         and multilingual explanations.",
        [
            ("Risk Analysis", Color::Green),
            ("Clause Highlighting", Color::Yellow),
            ("Multi-language", Color::Blue),
        ],
    );
    render_home_card(
        frame,
        qa_area,
        app.home_card == 1,
        " Interactive Q&A ",
        "Ask legal questions directly",
        "Get instant answers to your legal questions with AI assistance. Available in text \
         and voice formats.",
        [
            ("Text Chat", Color::Green),
            ("Voice Support", Color::Yellow),
            ("Indian Law", Color::Blue),
        ],
    );

    let [smart_area, voice_area, lang_area] = Layout::horizontal([
        Constraint::Percentage(33),
        Constraint::Percentage(34),
        Constraint::Percentage(33),
    ])
    .areas(features_area);

    render_feature(
        frame,
        smart_area,
        " Smart Analysis ",
        "Advanced AI analyzes legal documents for risks, implications, and next steps \
         specific to Indian law.",
    );
    render_feature(
        frame,
        voice_area,
        " Voice Assistant ",
        "Interact with our AI assistant through voice commands in multiple Indian languages.",
    );
    render_feature(
        frame,
        lang_area,
        " Multi-language ",
        "Get explanations and analysis in your preferred Indian language for better \
         understanding.",
    );

    let disclaimer = Paragraph::new(Line::from(vec![
        Span::styled("Important: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            "This AI assistant provides information and analysis for educational purposes \
             only. It does not constitute legal advice. For specific legal matters, please \
             consult with a qualified legal professional. All document uploads are encrypted \
             and securely processed in compliance with Indian data protection laws.",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(disclaimer, disclaimer_area);
}

fn render_home_card(
    frame: &mut Frame,
    area: Rect,
    selected: bool,
    title: &'static str,
    subtitle: &'static str,
    body: &'static str,
    chips: [(&'static str, Color); 3],
) {
    let border_color = if selected { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let mut chip_spans: Vec<Span> = Vec::new();
    for (i, (chip, color)) in chips.into_iter().enumerate() {
        if i > 0 {
            chip_spans.push(Span::raw("   "));
        }
        chip_spans.push(Span::styled(
            chip,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }

    let card = Paragraph::new(vec![
        Line::from(Span::styled(subtitle, Style::default().fg(Color::DarkGray))),
        Line::default(),
        Line::from(body),
        Line::default(),
        Line::from(chip_spans),
    ])
    .wrap(Wrap { trim: true })
    .block(block);

    frame.render_widget(card, area);
}

fn render_feature(frame: &mut Frame, area: Rect, title: &'static str, body: &'static str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(title);
    let feature = Paragraph::new(body).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(feature, area);
}

fn render_upload(app: &mut App, frame: &mut Frame, area: Rect) {
    let [left_area, side_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(34),
    ])
    .areas(area);

    let [browser_area, file_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(7),
    ])
    .areas(left_area);

    // Store area for mouse hit-testing
    app.browser_area = Some(browser_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", app.browser.dir.display()));

    let items: Vec<ListItem> = app
        .browser
        .entries
        .iter()
        .map(|entry| {
            if entry.is_dir {
                ListItem::new(format!(" {}/", entry.name))
                    .style(Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD))
            } else {
                ListItem::new(format!(" {}  {}", entry.name, format_size(entry.size_bytes)))
            }
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, browser_area, &mut app.browser_state);

    render_file_panel(app, frame, file_area);

    let [security_area, benefits_area, notice_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(9),
        Constraint::Min(0),
    ])
    .areas(side_area);

    let security = Paragraph::new(vec![
        Line::from("• End-to-end encryption"),
        Line::from("• No permanent storage"),
        Line::from("• GDPR compliant processing"),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Security & Privacy "),
    );
    frame.render_widget(security, security_area);

    let benefits = Paragraph::new(vec![
        Line::from("• Risk assessment with color coding"),
        Line::from("• Clause-by-clause explanation"),
        Line::from("• Next steps recommendations"),
        Line::from("• Multi-language explanations"),
        Line::from("• Negotiation suggestions"),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" What You'll Get "),
    );
    frame.render_widget(benefits, benefits_area);

    let notice = Paragraph::new(
        "This AI analysis is for informational purposes only and does not constitute legal \
         advice. For complex legal matters, please consult with a qualified attorney.",
    )
    .style(Style::default().fg(Color::DarkGray))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Important Notice "),
    );
    frame.render_widget(notice, notice_area);
}

fn render_file_panel(app: &App, frame: &mut Frame, area: Rect) {
    let (border_color, lines) = if app.uploading {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        let name = app
            .pending_file
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        (
            Color::Yellow,
            vec![
                Line::from(Span::styled(name, Style::default().add_modifier(Modifier::BOLD))),
                Line::from(Span::styled(
                    format!("Processing{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                )),
            ],
        )
    } else if let Some(file) = &app.pending_file {
        (
            Color::Green,
            vec![
                Line::from(Span::styled(
                    file.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("{}  {}", file.kind.label(), format_size(file.size_bytes))),
                Line::default(),
                Line::from(Span::styled("Ready to analyze", Style::default().fg(Color::Green))),
            ],
        )
    } else {
        (
            Color::DarkGray,
            vec![
                Line::from(Span::styled(
                    "No document selected",
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(Span::styled(
                    "Pick a file from the browser with Enter.",
                    Style::default().fg(Color::DarkGray),
                )),
                Line::from(Span::styled(
                    "Supports PDF, JPG, PNG files up to 20MB",
                    Style::default().fg(Color::DarkGray),
                )),
            ],
        )
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Selected Document "),
    );
    frame.render_widget(panel, area);
}

fn render_analysis(app: &mut App, frame: &mut Frame, area: Rect) {
    if app.analyzing {
        render_analyzing_wait(app, frame, area);
        return;
    }
    if app.report.is_none() {
        let placeholder = Paragraph::new("No analysis available")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(placeholder, area);
        return;
    }

    let [summary_area, main_area] = Layout::vertical([
        Constraint::Length(9),
        Constraint::Min(0),
    ])
    .areas(area);

    render_summary(app, frame, summary_area);

    let [left_area, right_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(main_area);

    let [clause_area, guidance_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(9),
    ])
    .areas(left_area);

    render_clause_list(app, frame, clause_area);
    render_guidance(app, frame, guidance_area);

    let notice_height: u16 = if app.chat_notice.is_some() { 1 } else { 0 };
    let [details_area, chat_area, notice_area, input_area] = Layout::vertical([
        Constraint::Length(14),
        Constraint::Min(0),
        Constraint::Length(notice_height),
        Constraint::Length(3),
    ])
    .areas(right_area);

    render_clause_details(app, frame, details_area);
    render_doc_chat(app, frame, chat_area);
    if let Some(notice) = &app.chat_notice {
        let warning = Paragraph::new(notice.clone()).style(Style::default().fg(Color::Red));
        frame.render_widget(warning, notice_area);
    }
    render_doc_input(app, frame, input_area);
}

fn render_analyzing_wait(app: &App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    let mut lines: Vec<Line> = Vec::new();
    if let Some(doc) = &app.document {
        lines.push(Line::from(Span::styled(
            doc.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }
    let dots = ".".repeat((app.animation_frame as usize) + 1);
    lines.push(Line::from(Span::styled(
        format!("AI is processing your document{}", dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));
    lines.push(Line::default());
    for stage in ANALYZING_STAGES {
        lines.push(Line::from(format!("• {}", stage)));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Press Esc to cancel",
        Style::default().fg(Color::DarkGray),
    )));

    let popup_width = 48.min(area.width.saturating_sub(4));
    let popup_height = (lines.len() as u16 + 2).min(area.height);
    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Analyzing Document ");
    frame.render_widget(Paragraph::new(lines).block(block), popup_area);
}

fn render_summary(app: &App, frame: &mut Frame, area: Rect) {
    let Some(report) = app.report.as_ref() else {
        return;
    };

    let mut lines = vec![
        Line::from(report.summary.clone()),
        Line::default(),
        Line::from(vec![
            Span::raw("Risk: "),
            Span::styled(
                report.overall_risk.label(),
                Style::default()
                    .fg(risk_color(report.overall_risk))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if report.human_review_required {
        lines.push(Line::from(vec![
            Span::styled(
                "Human Review Recommended  ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "This document contains high-risk clauses that should be reviewed by a \
                 qualified legal professional.",
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    }

    let title = match &app.document {
        Some(doc) => format!(" {} ", doc.name),
        None => " Document Summary ".to_string(),
    };
    let summary = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title),
    );
    frame.render_widget(summary, area);
}

fn render_clause_list(app: &mut App, frame: &mut Frame, area: Rect) {
    app.clause_area = Some(area);

    let focused = app.analysis_pane == AnalysisPane::Clauses;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let Some(report) = app.report.as_ref() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Clause-by-Clause Analysis ({}) ", report.clauses.len()));

    let items: Vec<ListItem> = report
        .clauses
        .iter()
        .map(|clause| {
            let preview: String = clause.text.chars().take(60).collect();
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("[{}]", clause.category.label()),
                    Style::default()
                        .fg(category_color(clause.category))
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("{}...", preview)),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.clause_state);
}

fn render_guidance(app: &App, frame: &mut Frame, area: Rect) {
    let Some(report) = app.report.as_ref() else {
        return;
    };

    let focused = app.analysis_pane == AnalysisPane::Guidance;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let active = Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let inactive = Style::default().fg(Color::DarkGray);
    let (next_style, negotiation_style) = match app.guidance_tab {
        GuidanceTab::NextSteps => (active, inactive),
        GuidanceTab::Negotiation => (inactive, active),
    };

    let title = Line::from(vec![
        Span::raw(" "),
        Span::styled(" Next Steps ", next_style),
        Span::raw(" "),
        Span::styled(" Negotiation Points ", negotiation_style),
        Span::raw(" "),
    ]);

    let lines: Vec<Line> = match app.guidance_tab {
        GuidanceTab::NextSteps => report
            .next_steps
            .iter()
            .enumerate()
            .map(|(i, step)| Line::from(format!("{}. {}", i + 1, step)))
            .collect(),
        GuidanceTab::Negotiation => report
            .negotiation_points
            .iter()
            .map(|point| Line::from(format!("• {}", point)))
            .collect(),
    };

    let guidance = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(title),
    );
    frame.render_widget(guidance, area);
}

fn render_clause_details(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Clause Details ");

    let Some(clause) = app.current_clause() else {
        let placeholder = Paragraph::new("Select a clause to view details")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let heading = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("[{}]", clause.category.label()),
            Style::default()
                .fg(category_color(clause.category))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(clause.text.clone()),
        Line::default(),
        Line::from(Span::styled("Explanation", heading)),
        Line::from(clause.explanation.clone()),
    ];
    if let Some(reference) = &clause.law_reference {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Legal Reference", heading)));
        lines.push(Line::from(Span::styled(
            reference.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if !clause.recommendations.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Recommendations", heading)));
        for rec in &clause.recommendations {
            lines.push(Line::from(format!("• {}", rec)));
        }
    }

    let details = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    frame.render_widget(details, area);
}

fn render_doc_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.doc_chat_area = Some(area);
    // Inner size minus borders, for scroll calculations
    app.doc_chat_height = area.height.saturating_sub(2);
    app.doc_chat_width = area.width.saturating_sub(2);

    let focused = app.analysis_pane == AnalysisPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" AI Assistant ");

    let lines = chat_lines(&app.doc_chat, app.animation_frame);
    let total_lines = lines.len() as u16;
    let chat_text = if lines.is_empty() {
        Text::from(Span::styled(
            "Ask me anything about your document analysis...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.doc_chat_scroll, 0));
    frame.render_widget(chat, area);

    if total_lines > app.doc_chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.doc_chat_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_doc_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask (i to type) ");

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.doc_cursor >= inner_width {
        app.doc_cursor - inner_width + 1
    } else {
        0
    };

    let input = if app.doc_input.is_empty() && !editing {
        Paragraph::new("Ask about your document...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
    } else {
        let visible: String = app
            .doc_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible)
            .style(Style::default().fg(Color::Cyan))
            .block(block)
    };
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (app.doc_cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_qa(app: &mut App, frame: &mut Frame, area: Rect) {
    let [left_area, side_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(38),
    ])
    .areas(area);

    let notice_height: u16 = if app.chat_notice.is_some() { 1 } else { 0 };
    let [log_area, notice_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(notice_height),
        Constraint::Length(3),
    ])
    .areas(left_area);

    // Store area for mouse hit-testing
    app.qa_chat_area = Some(log_area);
    // Inner size minus borders, for scroll calculations
    app.qa_chat_height = log_area.height.saturating_sub(2);
    app.qa_chat_width = log_area.width.saturating_sub(2);

    let chat_focused = app.qa_pane == QaPane::Chat;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if chat_focused { Color::Cyan } else { Color::DarkGray }))
        .title(" AI Legal Assistant ");

    let lines = chat_lines(&app.qa_chat, app.animation_frame);
    let total_lines = lines.len() as u16;
    let chat_text = if lines.is_empty() {
        Text::from(Span::styled(
            "Ask your legal question...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.qa_scroll, 0));
    frame.render_widget(chat, log_area);

    if total_lines > app.qa_chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));
        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.qa_scroll as usize);
        frame.render_stateful_widget(
            scrollbar,
            log_area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }

    if let Some(notice) = &app.chat_notice {
        let warning = Paragraph::new(notice.clone()).style(Style::default().fg(Color::Red));
        frame.render_widget(warning, notice_area);
    }

    render_qa_input(app, frame, input_area);

    let [question_area, legend_area, disclaimer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(6),
        Constraint::Length(7),
    ])
    .areas(side_area);

    render_question_list(app, frame, question_area);

    let legend_lines: Vec<Line> = RiskCategory::legend()
        .into_iter()
        .map(|(category, name, description)| {
            Line::from(vec![
                Span::styled(
                    format!("● {}", name),
                    Style::default()
                        .fg(category_color(category))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", description), Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();
    let legend = Paragraph::new(legend_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Response Categories "),
    );
    frame.render_widget(legend, legend_area);

    let disclaimer = Paragraph::new(
        "AI responses are for informational purposes only. For specific legal matters, \
         consult with a qualified attorney licensed to practice in your jurisdiction.",
    )
    .style(Style::default().fg(Color::DarkGray))
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Legal Notice "),
    );
    frame.render_widget(disclaimer, disclaimer_area);
}

fn render_qa_input(app: &App, frame: &mut Frame, area: Rect) {
    let listening = app.voice == VoiceState::Listening;
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if listening {
        Color::Red
    } else if editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let title = if listening {
        " Recording (v to stop) "
    } else {
        " Ask (i to type, v for voice) "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Calculate visible portion of input with horizontal scrolling
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.qa_cursor >= inner_width {
        app.qa_cursor - inner_width + 1
    } else {
        0
    };

    let input = if listening {
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Paragraph::new(format!("Listening{}", dots))
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
            .block(block)
    } else if app.qa_input.is_empty() && !editing {
        Paragraph::new("Ask your legal question...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
    } else {
        let visible: String = app
            .qa_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible)
            .style(Style::default().fg(Color::Cyan))
            .block(block)
    };
    frame.render_widget(input, area);

    if editing && !listening {
        let cursor_x = (app.qa_cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_question_list(app: &mut App, frame: &mut Frame, area: Rect) {
    app.question_area = Some(area);

    let focused = app.qa_pane == QaPane::Questions;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Common Questions ");

    // Room inside the borders and the highlight symbol
    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = COMMON_QUESTIONS
        .iter()
        .map(|question| {
            let lines: Vec<Line> = wrap_words(question, width)
                .into_iter()
                .map(Line::from)
                .collect();
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.question_state);
}

fn render_language_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    let languages = Language::all();
    let current = if app.session.is_some() {
        app.language
    } else {
        app.auth_language
    };

    // Calculate popup size and position (centered)
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = (languages.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Language (Esc to cancel) ");

    let items: Vec<ListItem> = languages
        .iter()
        .map(|lang| {
            let style = if *lang == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", lang.display_name())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.language_picker_state);
}

fn render_state_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    // Calculate popup size and position (centered)
    let popup_width = 44.min(area.width.saturating_sub(4));
    let popup_height = (INDIAN_STATES.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select State (Esc to cancel) ");

    let items: Vec<ListItem> = INDIAN_STATES
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let style = if Some(i) == app.auth_state_idx {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", state)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.state_picker_state);
}

fn render_toasts(app: &App, frame: &mut Frame, area: Rect) {
    use ratatui::widgets::Clear;

    let width = 44.min(area.width.saturating_sub(4));
    if width == 0 {
        return;
    }
    let height: u16 = 4;

    for (i, toast) in app.toasts.iter().take(3).enumerate() {
        let y = 1 + (i as u16) * (height + 1);
        if y + height > area.height {
            break;
        }
        let x = area.width.saturating_sub(width + 2);
        let toast_area = Rect::new(x, y, width, height);

        let border_color = match toast.kind {
            ToastKind::Info => Color::Cyan,
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };

        frame.render_widget(Clear, toast_area);
        let body = Paragraph::new(toast.body.clone()).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(format!(" {} ", toast.title)),
        );
        frame.render_widget(body, toast_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample_report;
    use crate::config::Config;
    use crate::document::{DocumentKind, UploadedDocument};
    use crate::profile::UserProfile;
    use crate::services::{ChatScope, ServiceError, Services};
    use crate::tui::AppEvent;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn test_app() -> (App, mpsc::UnboundedReceiver<AppEvent>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let mut config = Config::new();
        config.start_dir = Some(tmp.path().to_string_lossy().into_owned());
        let mut app = App::new(config, Services::simulated_instant(), tx).unwrap();
        app.session = Some(UserProfile {
            name: Some("Priya Sharma".to_string()),
            phone: "9876543210".to_string(),
            email: None,
            preferred_language: Language::En,
            state: None,
        });
        (app, rx, tmp)
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn failed_document_reply_shows_a_notice() {
        let (mut app, _rx, _tmp) = test_app();
        app.document_uploaded(UploadedDocument {
            name: "lease.pdf".to_string(),
            kind: DocumentKind::Pdf,
            size_bytes: 3,
            data: b"pdf".to_vec(),
        });
        let gen = app.analysis_gen;
        app.on_analyzed(gen, Ok(sample_report()));

        app.doc_input = "Can the landlord keep the deposit?".to_string();
        app.send_doc_chat();
        let epoch = app.doc_chat.epoch();
        let user_id = app.doc_chat.messages().last().unwrap().id;

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen_text(&terminal).contains("Thinking"));

        app.on_reply(
            ChatScope::Document,
            epoch,
            user_id,
            Err(ServiceError::Chat("assistant unavailable".to_string())),
        );
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        let screen = screen_text(&terminal);
        assert!(!screen.contains("Thinking"));
        assert!(screen.contains("assistant unavailable"));
    }
}
