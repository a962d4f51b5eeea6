use blog_shared::Article;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ArticleField, CommentField, CommentForm, DeleteTarget, View};

pub fn draw(f: &mut Frame, app: &App) {
    match app.view {
        View::Home => draw_home(f, app),
        View::ArticleDetail => draw_article_detail(f, app),
        View::AddArticle => draw_add_article(f, app),
    }

    if let Some(target) = app.confirm_delete {
        draw_delete_confirm_popup(f, target);
    }

    // Draw error overlay if present
    if let Some(ref error) = app.error_message {
        draw_error_popup(f, error);
    }
}

fn screen_chunks(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(area)
}

fn draw_header(f: &mut Frame, area: Rect, title: &str) {
    let header = Paragraph::new(Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL));

    f.render_widget(header, area);
}

fn draw_home(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.area());
    draw_header(f, chunks[0], " Blog ");

    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|summary| {
            let article = &summary.article;
            ListItem::new(vec![
                Line::from(Span::styled(
                    article.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!(
                        "  {} | {} | {} comments",
                        article.author,
                        byline_date(article),
                        summary.comment_count
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Articles ({}) ", app.articles.len()))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.articles.is_empty() {
        state.select(Some(app.selected_article));
    }
    f.render_stateful_widget(list, chunks[1], &mut state);

    draw_status_bar(
        f,
        chunks[2],
        app,
        "j/k: move | Enter: open | n: new | d: delete | r: refresh | q: quit",
    );
}

fn draw_article_detail(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.area());

    let Some(current) = app.current.as_ref() else {
        draw_header(f, chunks[0], " Article ");
        return;
    };
    let article = &current.article;
    draw_header(f, chunks[0], &format!(" {} ", article.title));

    let body = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    let content = Paragraph::new(article.content.as_str())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!(" by {} on {} ", article.author, byline_date(article)))
                .borders(Borders::ALL),
        );
    f.render_widget(content, body[0]);

    let rows = app.comment_rows();
    let items: Vec<ListItem> = rows
        .iter()
        .map(|(depth, node)| {
            let indent = "  ".repeat(*depth);
            let marker = if node.comment.is_reply() { "↳ " } else { "" };
            let mut lines = vec![Line::from(vec![
                Span::raw(format!("{}{}", indent, marker)),
                Span::styled(
                    node.comment.author.clone(),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {}", node.comment.created_at.format("%Y-%m-%d %H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];
            for text in node.comment.content.lines() {
                lines.push(Line::from(format!("{}  {}", indent, text)));
            }
            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Comments ({}) ", rows.len()))
                .borders(Borders::ALL),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(app.selected_comment));
    }
    f.render_stateful_widget(list, body[1], &mut state);

    let hints = if app.comment_form.is_some() {
        "Tab: next field | Enter: newline | Ctrl+S: submit | Esc: cancel"
    } else {
        "j/k: select | c: comment | R: reply | e: edit | x: delete | Esc: back"
    };
    draw_status_bar(f, chunks[2], app, hints);

    if let Some(form) = app.comment_form {
        draw_comment_form(f, app, form);
    }
}

fn draw_comment_form(f: &mut Frame, app: &App, form: CommentForm) {
    let area = centered_rect(60, 40, f.area());
    f.render_widget(Clear, area);

    let title = match form {
        CommentForm::New => " New Comment ".to_string(),
        CommentForm::Reply(id) => format!(" Reply to #{} ", id),
        CommentForm::Edit(id) => format!(" Edit #{} ", id),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(inner);

    let editing = matches!(form, CommentForm::Edit(_));
    if !editing {
        f.render_widget(
            input_box(
                "Author",
                &app.comment_author,
                app.comment_field == CommentField::Author,
            ),
            chunks[0],
        );
    }

    let content_area = if editing { inner } else { chunks[1] };
    f.render_widget(
        input_box(
            "Content",
            &app.comment_content,
            app.comment_field == CommentField::Content,
        ),
        content_area,
    );
}

fn draw_add_article(f: &mut Frame, app: &App) {
    let chunks = screen_chunks(f.area());
    draw_header(f, chunks[0], " New Article ");

    let fields = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(chunks[1]);

    f.render_widget(
        input_box(
            "Title",
            &app.draft.title,
            app.draft_field == ArticleField::Title,
        ),
        fields[0],
    );
    f.render_widget(
        input_box(
            "Author",
            &app.draft.author,
            app.draft_field == ArticleField::Author,
        ),
        fields[1],
    );
    f.render_widget(
        input_box(
            "Content",
            &app.draft.content,
            app.draft_field == ArticleField::Content,
        ),
        fields[2],
    );

    draw_status_bar(
        f,
        chunks[2],
        app,
        "Tab: next field | Enter: newline in content | Ctrl+S: publish | Esc: cancel",
    );
}

fn input_box<'a>(label: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let text = if focused {
        format!("{}_", value)
    } else {
        value.to_string()
    };

    Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(format!(" {} ", label))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    )
}

fn draw_status_bar(f: &mut Frame, area: Rect, app: &App, hints: &str) {
    let (mode, mode_color) = if app.confirm_delete.is_some() {
        ("DELETE", Color::Red)
    } else if app.comment_form.is_some() || app.view == View::AddArticle {
        ("INSERT", Color::Green)
    } else {
        ("NORMAL", Color::Blue)
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode),
            Style::default().bg(mode_color).fg(Color::White),
        ),
        Span::raw(" "),
        Span::styled(hints.to_string(), Style::default().fg(Color::DarkGray)),
    ];
    if let Some(ref status) = app.status_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(status.clone(), Style::default().fg(Color::Green)));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_delete_confirm_popup(f: &mut Frame, target: DeleteTarget) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let message = match target {
        DeleteTarget::Article(_) => "Delete this article and all of its comments?",
        DeleteTarget::Comment(_) => "Delete this comment and all replies to it?",
    };

    let text = Paragraph::new(vec![
        Line::from(message),
        Line::from(""),
        Line::from(Span::styled(
            "y: confirm | any other key: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(" Confirm ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );

    f.render_widget(text, area);
}

fn draw_error_popup(f: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, f.area());

    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let text = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(block);

    f.render_widget(text, area);
}

fn byline_date(article: &Article) -> String {
    article.created_at.format("%Y-%m-%d").to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
