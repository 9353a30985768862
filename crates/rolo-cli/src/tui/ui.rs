//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use rolo_core::{ContactStore, SortDirection};

use super::app::{ActivePane, App, EditorFocus, InputMode, TextInput};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, store: &ContactStore) {
    // Create vertical layout for status bar at the bottom
    let outer_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(outer_chunks[0]);

    draw_contacts_pane(frame, app, store, pane_chunks[0]);
    draw_fields_pane(frame, app, store, pane_chunks[1]);

    match app.input_mode {
        InputMode::Normal | InputMode::EditField => draw_status_bar(frame, app, outer_chunks[1]),
        InputMode::Filter => draw_filter_input(frame, app, store, outer_chunks[1]),
        InputMode::Prompt => draw_prompt(frame, app, outer_chunks[1]),
        InputMode::Confirm => draw_confirm(frame, app, store, outer_chunks[1]),
    }

    if app.input_mode == InputMode::EditField {
        draw_field_editor(frame, app);
    }

    // Draw help overlay if visible
    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn pane_styles(is_active: bool) -> (Style, Style) {
    if is_active {
        (
            Style::default().add_modifier(Modifier::BOLD),
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        )
    } else {
        (
            Style::default(),
            Style::default().add_modifier(Modifier::REVERSED),
        )
    }
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Draw the contacts pane (left)
fn draw_contacts_pane(frame: &mut Frame, app: &App, store: &ContactStore, area: Rect) {
    let is_active = app.active_pane == ActivePane::Contacts;
    let max_len = area.width.saturating_sub(4) as usize;
    let contacts = store.filtered_contacts();

    let items: Vec<ListItem> = contacts
        .iter()
        .map(|contact| {
            let mut spans = Vec::new();
            if contact.is_favorite {
                spans.push(Span::styled("★ ", Style::default().fg(Color::Yellow)));
            }
            spans.push(Span::raw(clip(&contact.name, max_len)));

            let mut lines = vec![Line::from(spans)];
            if let Some(first) = contact.who.lines().find(|l| !l.trim().is_empty()) {
                lines.push(Line::from(Span::styled(
                    clip(first.trim(), max_len.saturating_sub(2)),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let mut title = format!(" Contacts ({}) ", contacts.len());
    if store.show_favorites_only() {
        title = format!(" ★ Favorites ({}) ", contacts.len());
    }
    if !store.contact_search_query().is_empty() {
        title.push_str(&format!("/{} ", store.contact_search_query()));
    }

    let (border_style, highlight_style) = pane_styles(is_active);
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if contacts.is_empty() {
        let hint = if store.contact_count() == 0 {
            "No contacts yet. Press 'a' to add one"
        } else {
            "No matches"
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        )))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style);

    let mut state = ListState::default();
    state.select(Some(app.contact_index));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Draw the selected contact (right): description above its fields
fn draw_fields_pane(frame: &mut Frame, app: &App, store: &ContactStore, area: Rect) {
    let is_active = app.active_pane == ActivePane::Fields;
    let (border_style, highlight_style) = pane_styles(is_active);

    let Some(contact) = store.selected_contact() else {
        let block = Block::default()
            .title(" Fields ")
            .borders(Borders::ALL)
            .border_style(border_style);
        let paragraph = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Select a contact to view details",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let who_height = (contact.who.lines().count().clamp(1, 5) + 2) as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(who_height), Constraint::Min(3)])
        .split(area);

    let name = if contact.is_favorite {
        format!(" ★ {} ", contact.name)
    } else {
        format!(" {} ", contact.name)
    };
    let who = if contact.who.trim().is_empty() {
        Paragraph::new(Span::styled(
            "Who is this? Press 'w' to describe",
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Paragraph::new(contact.who.as_str())
    };
    let who = who
        .block(
            Block::default()
                .title(name)
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(who, chunks[0]);

    let fields = app.visible_fields(store);
    let label_width = fields
        .iter()
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0)
        .min(20);
    let value_max = (chunks[1].width as usize).saturating_sub(label_width + 8);

    let items: Vec<ListItem> = fields
        .iter()
        .map(|field| {
            let marker = if field.is_editing { "✎ " } else { "  " };
            Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{:<width$}", clip(&field.label, label_width), width = label_width),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::raw(clip(&field.value, value_max)),
            ])
            .into()
        })
        .collect();

    let arrow = match app.field_sort {
        SortDirection::Ascending => "↑",
        SortDirection::Descending => "↓",
    };
    let mut title = format!(" Fields ({}) {} ", fields.len(), arrow);
    if !store.field_search_query().is_empty() {
        title.push_str(&format!("/{} ", store.field_search_query()));
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    if fields.is_empty() {
        let hint = if contact.fields.is_empty() {
            "No fields. Press 'n' to add one"
        } else {
            "No matches"
        };
        let paragraph = Paragraph::new(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        ))
        .block(block);
        frame.render_widget(paragraph, chunks[1]);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style);

    let mut state = ListState::default();
    if is_active {
        state.select(Some(app.field_index));
    }

    frame.render_stateful_widget(list, chunks[1], &mut state);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let content = if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        match (app.input_mode, app.active_pane) {
            (InputMode::EditField, _) => {
                "Tab:label/value  Enter:save  Esc:cancel".to_string()
            }
            (_, ActivePane::Contacts) => {
                "a:add  r:rename  w:who  f:fav  F:favs  d:del  x:export  /:search  ?:help  q:quit"
                    .to_string()
            }
            (_, ActivePane::Fields) => {
                "n:new  e:edit  D:del  s:sort  /:search  Esc:back  ?:help  q:quit".to_string()
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Draw a single-line input with a styled prefix and place the cursor
fn draw_input_line(
    frame: &mut Frame,
    area: Rect,
    prefix: &str,
    color: Color,
    input: &TextInput,
    suffix: Option<String>,
) {
    let mut spans = vec![
        Span::styled(prefix.to_string(), Style::default().fg(color)),
        Span::raw(input.text.as_str()),
    ];
    if let Some(suffix) = suffix {
        spans.push(Span::styled(
            suffix,
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    // Position cursor
    let cursor_x = area.x + (prefix.chars().count() + input.cursor) as u16;
    frame.set_cursor_position((cursor_x, area.y));
}

/// Draw filter input at the bottom
fn draw_filter_input(frame: &mut Frame, app: &App, store: &ContactStore, area: Rect) {
    let matches = match app.active_pane {
        ActivePane::Contacts => store.filtered_contacts().len(),
        ActivePane::Fields => app.visible_fields(store).len(),
    };
    draw_input_line(
        frame,
        area,
        "/",
        Color::Cyan,
        &app.input,
        Some(format!("  ({} matches)", matches)),
    );
}

/// Draw the open prompt at the bottom
fn draw_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = app
        .prompt
        .map(|kind| format!("{}: ", kind.label()))
        .unwrap_or_default();
    draw_input_line(frame, area, &prefix, Color::Yellow, &app.input, None);
}

/// Draw the delete confirmation at the bottom
fn draw_confirm(frame: &mut Frame, app: &App, store: &ContactStore, area: Rect) {
    let name = app
        .pending_delete
        .and_then(|id| store.contact(id))
        .map(|c| c.name.as_str())
        .unwrap_or("contact");

    let line = Line::from(vec![
        Span::styled(
            format!("Delete '{}'? ", name),
            Style::default().fg(Color::Red),
        ),
        Span::styled("(y/n)", Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Draw the field editor popup
fn draw_field_editor(frame: &mut Frame, app: &App) {
    let Some(editor) = &app.editor else {
        return;
    };
    let area = frame.area();

    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let row_style = |focus: EditorFocus| {
        if editor.focus == focus {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        }
    };
    let text = vec![
        Line::from(vec![
            Span::styled("Label: ", row_style(EditorFocus::Label)),
            Span::raw(editor.label.text.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Value: ", row_style(EditorFocus::Value)),
            Span::raw(editor.value.text.as_str()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab:switch  Enter:save  Esc:cancel",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Edit Field ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(Paragraph::new(text).block(block), popup_area);

    let (row, input) = match editor.focus {
        EditorFocus::Label => (0, &editor.label),
        EditorFocus::Value => (1, &editor.value),
    };
    let cursor_x = popup_area.x + 1 + ("Label: ".len() + input.cursor) as u16;
    let cursor_x = cursor_x.min(popup_area.right().saturating_sub(2));
    frame.set_cursor_position((cursor_x, popup_area.y + 1 + row));
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Calculate centered popup area
    let popup_width = 50.min(area.width.saturating_sub(4));
    let popup_height = 28.min(area.height.saturating_sub(2));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the popup area
    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  g/G         Jump to first/last"),
        Line::from("  Enter, l    Open contact"),
        Line::from("  Esc, h      Back to contacts"),
        Line::from("  /           Search current pane"),
        Line::from(""),
        Line::from("Contacts:"),
        Line::from("  a           Add contact"),
        Line::from("  r           Rename"),
        Line::from("  w           Edit who (in $EDITOR)"),
        Line::from("  f / F       Favorite / favorites only"),
        Line::from("  d           Delete"),
        Line::from("  x           Export (md, pdf)"),
        Line::from(""),
        Line::from("Fields:"),
        Line::from("  n           New field"),
        Line::from("  Enter, e    Edit field"),
        Line::from("  D           Delete field"),
        Line::from("  s           Flip sort order"),
        Line::from(""),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, popup_area);
}
