// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    ConfirmDelete,
    ConfirmOverwrite,
    NewTableName,
    NewTableColumns,
    ConfirmDrop,
}

impl PromptKind {
    pub const fn expects_yes_no(self) -> bool {
        matches!(
            self,
            Self::ConfirmDelete | Self::ConfirmOverwrite | Self::ConfirmDrop
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Filter,
    Append,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub status_line: Option<String>,
    pub help_visible: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            status_line: None,
            help_visible: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    EnterFilter,
    EnterAppend,
    OpenPrompt(PromptKind),
    ExitToNav,
    ToggleHelp,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    HelpToggled(bool),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::EnterFilter => {
                self.mode = AppMode::Filter;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("filter")]
            }
            AppCommand::EnterAppend => {
                self.mode = AppMode::Append;
                vec![AppEvent::ModeChanged(self.mode), self.set_status("add record")]
            }
            AppCommand::OpenPrompt(kind) => {
                self.mode = AppMode::Prompt(kind);
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ExitToNav => {
                self.mode = AppMode::Nav;
                vec![AppEvent::ModeChanged(self.mode)]
            }
            AppCommand::ToggleHelp => {
                self.help_visible = !self.help_visible;
                vec![AppEvent::HelpToggled(self.help_visible)]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, AppMode::Filter | AppMode::Append)
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
