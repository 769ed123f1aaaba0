//! Resume decision engine
//!
//! Decides on open whether to continue silently, ask, or start from the top.

use crate::store::{ResumePreference, WatchProgress};
use serde::{Deserialize, Serialize};

/// Where a session starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResumeDecision {
    /// Start silently at the given position
    StartAt(f64),
    /// Ask the user whether to continue from the saved position
    PromptResume(f64),
}

impl ResumeDecision {
    pub fn is_prompt(&self) -> bool {
        matches!(self, ResumeDecision::PromptResume(_))
    }
}

/// Decide how to start from saved progress and the user's preference
pub fn decide(
    progress: Option<&WatchProgress>,
    preference: ResumePreference,
    finished_threshold: f64,
) -> ResumeDecision {
    let Some(progress) = progress else {
        return ResumeDecision::StartAt(0.0);
    };
    let Some(watched) = progress.watched_fraction() else {
        return ResumeDecision::StartAt(0.0);
    };

    // Effectively finished: never resume into the credits
    if watched >= finished_threshold {
        return ResumeDecision::StartAt(0.0);
    }

    let saved = progress.current_time;
    match preference {
        ResumePreference::AlwaysResume => ResumeDecision::StartAt(saved),
        ResumePreference::AlwaysStartOver => ResumeDecision::StartAt(0.0),
        ResumePreference::AlwaysAsk => ResumeDecision::PromptResume(saved),
    }
}

/// Button chosen on the resume prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptChoice {
    Resume,
    StartOver,
}

/// User's answer to the resume prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptAnswer {
    pub choice: PromptChoice,
    /// "Remember my choice" checkbox
    pub remember: bool,
}

impl PromptAnswer {
    pub fn resume() -> Self {
        Self { choice: PromptChoice::Resume, remember: false }
    }

    pub fn start_over() -> Self {
        Self { choice: PromptChoice::StartOver, remember: false }
    }

    pub fn remembered(mut self) -> Self {
        self.remember = true;
        self
    }

    /// Preference to persist, if the user asked to remember the choice
    pub fn remembered_preference(&self) -> Option<ResumePreference> {
        self.remember.then_some(match self.choice {
            PromptChoice::Resume => ResumePreference::AlwaysResume,
            PromptChoice::StartOver => ResumePreference::AlwaysStartOver,
        })
    }

    /// Start position for a prompt offering `saved_time`
    pub fn start_time(&self, saved_time: f64) -> f64 {
        match self.choice {
            PromptChoice::Resume => saved_time,
            PromptChoice::StartOver => 0.0,
        }
    }
}
