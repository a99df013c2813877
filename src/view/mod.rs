//! Terminal rendering of the in-memory todo list.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::types::Todo;

const STRIKE_ON: &str = "\x1b[9m";
const DIM_ON: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Placeholder shown for an empty list.
pub const EMPTY_PLACEHOLDER: &str = "No todos yet. Add one with `add <title>`.";

/// How completed titles are marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strikethrough {
    /// ANSI strikethrough escape.
    Ansi,
    /// `~title~` for terminals without styling.
    Plain,
}

/// One rendered todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTodo {
    pub position: usize,
    pub id: String,
    pub completed: bool,
    pub text: String,
}

/// Transient, non-authoritative copy of the backend's list plus its renderer.
#[derive(Debug, Clone)]
pub struct TodoView {
    todos: Vec<Todo>,
    strike: Strikethrough,
}

impl Default for TodoView {
    fn default() -> Self {
        Self::new(Strikethrough::Plain)
    }
}

impl TodoView {
    pub fn new(strike: Strikethrough) -> Self {
        Self {
            todos: Vec::new(),
            strike,
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Replace the whole list with a fresh fetch.
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
    }

    /// Newest first, matching the order a fresh create shows up in.
    pub fn insert_front(&mut self, todo: Todo) {
        self.todos.insert(0, todo);
    }

    /// Swap in the server's copy of an item. Returns `false` if it is not held.
    pub fn replace_item(&mut self, todo: Todo) -> bool {
        match self.todos.iter_mut().find(|t| t.id == todo.id) {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }

    /// Remove exactly the item with `id`.
    pub fn remove(&mut self, id: &str) -> Option<Todo> {
        let index = self.todos.iter().position(|t| t.id == id)?;
        Some(self.todos.remove(index))
    }

    /// Look up by id, or by 1-based position as printed by [`TodoView::render`].
    pub fn find(&self, selector: &str) -> Option<&Todo> {
        let selector = selector.trim();
        if let Some(todo) = self.todos.iter().find(|t| t.id == selector) {
            return Some(todo);
        }
        selector
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| self.todos.get(index))
    }

    /// Render in local time.
    pub fn render(&self) -> String {
        self.render_in(&Local)
    }

    pub fn render_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        if self.todos.is_empty() {
            return format!("{EMPTY_PLACEHOLDER}\n");
        }
        let mut out = String::new();
        for item in self.render_items_in(tz) {
            out.push_str(&item.text);
            out.push('\n');
        }
        out
    }

    /// One entry per held todo, in list order.
    pub fn render_items_in<Tz>(&self, tz: &Tz) -> Vec<RenderedTodo>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.todos
            .iter()
            .enumerate()
            .map(|(index, todo)| RenderedTodo {
                position: index + 1,
                id: todo.id.clone(),
                completed: todo.is_completed(),
                text: self.render_todo(index + 1, todo, tz),
            })
            .collect()
    }

    fn render_todo<Tz>(&self, position: usize, todo: &Todo, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let checkbox = if todo.is_completed() { "[x]" } else { "[ ]" };
        let title = match (todo.is_completed(), self.strike) {
            (true, Strikethrough::Ansi) => format!("{STRIKE_ON}{DIM_ON}{}{RESET}", todo.title),
            (true, Strikethrough::Plain) => format!("~{}~", todo.title),
            (false, _) => todo.title.clone(),
        };
        let mut meta = format!("created {}", format_timestamp(&todo.created_at, tz));
        if let Some(completed_at) = &todo.completed_at {
            meta.push_str(&format!(", completed {}", format_timestamp(completed_at, tz)));
        }
        format!(
            "{position:>3}. {checkbox} {title}\n       {meta} · id {}",
            todo.id
        )
    }
}

/// `Jan 5, 2025, 3:04 PM`
pub fn format_timestamp<Tz>(at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%b %-d, %Y, %-I:%M %p").to_string()
}
