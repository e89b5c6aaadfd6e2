// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map mode state machine.
//!
//! Exactly one of Navigation, PolygonEditing or Idle is active. Only
//! explicit user actions move between them, and every transition applies
//! the matching camera and editing affordances to the map surface.

use crate::error::CaptureError;
use crate::models::MapMode;
use crate::surface::MapSurface;

/// How polygon editing was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingEntry {
    /// No closed polygon: start or continue placing vertices
    FreshCapture,
    /// A closed polygon exists: its vertices become draggable
    ResumeEditing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeTransition {
    pub from: MapMode,
    pub to: MapMode,
    /// Set when the transition entered PolygonEditing
    pub editing: Option<EditingEntry>,
}

impl ModeTransition {
    pub fn left_editing(&self) -> bool {
        self.from == MapMode::PolygonEditing && self.to != MapMode::PolygonEditing
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModeController {
    mode: MapMode,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> MapMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == MapMode::PolygonEditing
    }

    /// Press one of the two mode toggles.
    ///
    /// Pressing the toggle of the active mode switches to Idle.
    pub fn toggle<S: MapSurface + ?Sized>(
        &mut self,
        target: MapMode,
        surface: &mut S,
        polygon_closed: bool,
    ) -> Result<ModeTransition, CaptureError> {
        if !target.is_toggleable() {
            return Err(CaptureError::InvalidModeTarget(target));
        }
        let next = if self.mode == target {
            MapMode::Idle
        } else {
            target
        };
        Ok(self.transition(next, surface, polygon_closed))
    }

    /// Drop into Idle, e.g. on parcel selection or polygon closure.
    pub fn force_idle<S: MapSurface + ?Sized>(&mut self, surface: &mut S) -> ModeTransition {
        self.transition(MapMode::Idle, surface, false)
    }

    fn transition<S: MapSurface + ?Sized>(
        &mut self,
        next: MapMode,
        surface: &mut S,
        polygon_closed: bool,
    ) -> ModeTransition {
        let from = self.mode;
        let mut editing = None;

        if from == MapMode::PolygonEditing && next != MapMode::PolygonEditing {
            surface.set_navigation_enabled(true);
            surface.set_vertex_handles(false);
        }

        if next == MapMode::PolygonEditing && from != MapMode::PolygonEditing {
            surface.set_navigation_enabled(false);
            if polygon_closed {
                surface.set_vertex_handles(true);
                editing = Some(EditingEntry::ResumeEditing);
            } else {
                editing = Some(EditingEntry::FreshCapture);
            }
        }

        surface.set_cursor(next.cursor());
        self.mode = next;

        if from != next {
            tracing::info!(from = ?from, to = ?next, "Map mode changed");
        }

        ModeTransition {
            from,
            to: next,
            editing,
        }
    }
}
