//! What the page shows: task list items, transient alerts and navigation.

use std::{
    fmt::{self, Write},
    time::{Duration, Instant},
};

use crate::model::{Task, TaskId};

pub const COMPLETED_CLASS: &str = "completed";

/// One rendered `<li>`: a text span, a checkbox and a delete control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: TaskId,
    pub content: String,
    pub checked: bool,
}

impl TaskItem {
    pub fn class(&self) -> Option<&'static str> {
        self.checked.then_some(COMPLETED_CLASS)
    }

    pub fn to_html(&self) -> String {
        let class = self
            .class()
            .map(|class| format!(r#" class="{class}""#))
            .unwrap_or_default();
        let checked = if self.checked { " checked" } else { "" };
        format!(
            r#"<li data-id="{id}"{class}><span class="task-content">{content}</span><input type="checkbox"{checked}><button class="delete-btn">Delete</button></li>"#,
            id = self.id,
            content = escape_html(&self.content),
        )
    }
}

impl From<&Task> for TaskItem {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            content: task.content.clone(),
            checked: task.completed,
        }
    }
}

/// Replaces the whole list; order is whatever the server sent.
pub fn render_task_list(tasks: &[Task]) -> Vec<TaskItem> {
    tasks.iter().map(TaskItem::from).collect()
}

pub fn render_task_list_html(items: &[TaskItem]) -> String {
    items.iter().fold(String::new(), |mut html, item| {
        html.push_str(&item.to_html());
        html
    })
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

impl AlertKind {
    pub fn class(self) -> &'static str {
        match self {
            AlertKind::Success => "success",
            AlertKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub kind: AlertKind,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: AlertKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: AlertKind::Error,
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="alert {}">{}</div>"#,
            self.kind.class(),
            escape_html(&self.message)
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.class(), self.message)
    }
}

/// Alerts currently on screen, each removed once its time is up.
#[derive(Debug, Clone)]
pub struct AlertBoard {
    ttl: Duration,
    shown: Vec<(Alert, Instant)>,
}

impl AlertBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            shown: Vec::new(),
        }
    }

    pub fn show(&mut self, alert: Alert, now: Instant) {
        self.shown.retain(|(_, expires)| *expires > now);
        self.shown.push((alert, now + self.ttl));
    }

    pub fn visible(&mut self, now: Instant) -> Vec<Alert> {
        self.shown.retain(|(_, expires)| *expires > now);
        self.shown.iter().map(|(alert, _)| alert.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Register,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Login => "/login",
            Page::Register => "/register",
        }
    }

    /// Only the home page shows a task list.
    pub fn shows_task_list(self) -> bool {
        matches!(self, Page::Home)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub to: Page,
    pub delay: Duration,
}

impl Navigation {
    pub fn now(to: Page) -> Self {
        Self {
            to,
            delay: Duration::ZERO,
        }
    }

    pub fn after(to: Page, delay: Duration) -> Self {
        Self { to, delay }
    }
}

/// Plain-text rendering for terminals.
pub fn render_task_list_text(items: &[TaskItem]) -> String {
    let mut out = String::new();
    for item in items {
        let mark = if item.checked { 'x' } else { ' ' };
        let _ = writeln!(out, "[{mark}] {:>4}  {}", item.id, item.content);
    }
    out
}
