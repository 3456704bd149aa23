//! Guides (Hilfslinien) eines Screens: Anlegen, Verschieben, Einrasten.
//!
//! Jeder Screen besitzt seinen eigenen `GuidesManager`. Der Manager hält
//! neben der Guide-Liste auch den Zustand der beiden interaktiven Abläufe
//! "neue Guide ziehen" und "bestehende Guide verschieben"; angenommen wird
//! ein Ablauf erst durch `accept_*`, abgebrochen durch `cancel_*`.

use glam::Vec2;

use crate::core::node::Rect;
use crate::shared::options::{GUIDE_STICK_THRESHOLD, STICK_TO_CENTERS, STICK_TO_SIDES};

/// Ausrichtung einer Guide-Linie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideKind {
    Horizontal,
    Vertical,
    /// Kreuz-Guide: rastet in beiden Achsen ein.
    Both,
}

/// Eine einzelne Guide-Linie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideData {
    pub kind: GuideKind,
    pub position: Vec2,
    pub selected: bool,
}

impl GuideData {
    pub fn new(kind: GuideKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            selected: false,
        }
    }

    /// Gleiche Linie wie `other` (Ausrichtung und Position, Selektion egal)?
    pub fn same_line(&self, other: &GuideData) -> bool {
        self.kind == other.kind && self.position == other.position
    }
}

/// Ergebnis einer Einrast-Berechnung.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickResult {
    /// Verschiebung, die die Controls auf die Guide einrasten lässt.
    pub offset: Vec2,
    pub sticked_x: bool,
    pub sticked_y: bool,
}

impl StickResult {
    pub fn sticked(&self) -> bool {
        self.sticked_x || self.sticked_y
    }
}

/// Verwalter aller Guides eines Screens.
#[derive(Debug, Clone)]
pub struct GuidesManager {
    guides: Vec<GuideData>,
    /// Guide, die gerade neu gezogen wird (noch nicht angenommen).
    new_guide: Option<GuideData>,
    /// Index der Guide, die gerade verschoben wird.
    move_index: Option<usize>,
    move_start_pos: Vec2,
    /// Control-Rechtecke, an denen die gezogene Guide einrastet.
    stick_rects: Vec<Rect>,
    stick_mode: u8,
    stick_threshold: f32,
    enabled: bool,
    locked: bool,
}

impl GuidesManager {
    pub fn new() -> Self {
        Self {
            guides: Vec::new(),
            new_guide: None,
            move_index: None,
            move_start_pos: Vec2::ZERO,
            stick_rects: Vec::new(),
            stick_mode: STICK_TO_SIDES | STICK_TO_CENTERS,
            stick_threshold: GUIDE_STICK_THRESHOLD,
            enabled: true,
            locked: false,
        }
    }

    // ── Zugriff ─────────────────────────────────────────────────────

    pub fn guides(&self) -> &[GuideData] {
        &self.guides
    }

    pub fn new_guide(&self) -> Option<&GuideData> {
        self.new_guide.as_ref()
    }

    pub fn guide_exists(&self, data: &GuideData) -> bool {
        self.guides.iter().any(|g| g.same_line(data))
    }

    // ── Neue Guide ziehen ───────────────────────────────────────────

    /// Beginnt das Ziehen einer neuen Guide. Bestehende Selektion wird
    /// aufgehoben, die neue Guide startet selektiert im Ursprung.
    pub fn start_new_guide(&mut self, kind: GuideKind, stick_rects: Vec<Rect>) {
        if self.new_guide.is_some() {
            // Es läuft bereits ein Anlege-Vorgang.
            return;
        }

        self.reset_selection();

        let mut guide = GuideData::new(kind, Vec2::ZERO);
        guide.selected = true;
        self.new_guide = Some(guide);
        self.stick_rects = stick_rects;
    }

    pub fn move_new_guide(&mut self, pos: Vec2) {
        let Some(mut guide) = self.new_guide.take() else {
            return;
        };
        self.move_guide_sticked(&mut guide, pos);
        self.new_guide = Some(guide);
    }

    /// Eine neue Guide darf nicht auf einer bereits existierenden liegen.
    pub fn can_accept_new_guide(&self) -> bool {
        match &self.new_guide {
            Some(guide) => !self.guide_exists(guide),
            None => false,
        }
    }

    /// Nimmt die neue Guide in die Liste auf und gibt sie zurück.
    /// Liegt sie auf einer bestehenden Guide, wird der Vorgang verworfen.
    pub fn accept_new_guide(&mut self) -> Option<GuideData> {
        if !self.can_accept_new_guide() {
            self.cancel_new_guide();
            return None;
        }

        let guide = self.new_guide.take()?;
        self.guides.push(guide);
        self.stick_rects.clear();
        Some(guide)
    }

    pub fn cancel_new_guide(&mut self) {
        self.new_guide = None;
        self.stick_rects.clear();
    }

    // ── Bestehende Guide verschieben ────────────────────────────────

    /// Beginnt das Verschieben der Guide unter `pos`. Liefert `false`,
    /// wenn dort keine Guide liegt oder die Guides gesperrt sind.
    pub fn start_move_guide(&mut self, pos: Vec2, stick_rects: Vec<Rect>) -> bool {
        if self.locked || !self.enabled {
            return false;
        }

        let Some(index) = self
            .guides
            .iter()
            .position(|g| self.is_guide_on_position(g, pos))
        else {
            return false;
        };

        self.reset_selection();
        self.guides[index].selected = true;
        self.move_index = Some(index);
        self.move_start_pos = self.guides[index].position;
        self.stick_rects = stick_rects;
        true
    }

    pub fn move_guide(&mut self, pos: Vec2) {
        let Some(index) = self.move_index else {
            return;
        };
        let mut guide = self.guides[index];
        self.move_guide_sticked(&mut guide, pos);
        self.guides[index] = guide;
    }

    pub fn move_guide_start_pos(&self) -> Vec2 {
        self.move_start_pos
    }

    /// Guide, die gerade verschoben wird.
    pub fn move_guide_data(&self) -> Option<&GuideData> {
        self.move_index.map(|i| &self.guides[i])
    }

    /// Schließt das Verschieben ab und gibt die Guide an ihrer neuen
    /// Position zurück.
    pub fn accept_move_guide(&mut self) -> Option<GuideData> {
        let index = self.move_index.take()?;
        self.stick_rects.clear();
        Some(self.guides[index])
    }

    /// Bricht das Verschieben ab und setzt die Guide auf die Startposition
    /// zurück.
    pub fn cancel_move_guide(&mut self) -> Option<GuideData> {
        let index = self.move_index.take()?;
        self.guides[index].position = self.move_start_pos;
        self.stick_rects.clear();
        Some(self.guides[index])
    }

    // ── Direkte Mutationen (Undo/Redo, Laden) ───────────────────────

    pub fn add_guide(&mut self, data: GuideData) {
        self.guides.push(data);
    }

    pub fn remove_guide(&mut self, data: &GuideData) -> bool {
        let Some(index) = self.guides.iter().position(|g| g.same_line(data)) else {
            return false;
        };
        self.guides.remove(index);
        true
    }

    /// Verschiebt die Guide mit der alten Position von `data` auf `new_pos`.
    pub fn update_guide_position(&mut self, data: &GuideData, new_pos: Vec2) -> bool {
        let Some(guide) = self.guides.iter_mut().find(|g| g.same_line(data)) else {
            return false;
        };
        guide.position = new_pos;
        true
    }

    // ── Selektion ───────────────────────────────────────────────────

    pub fn are_guides_selected(&self) -> bool {
        self.guides.iter().any(|g| g.selected)
    }

    pub fn selected_guides(&self) -> Vec<GuideData> {
        self.guides.iter().filter(|g| g.selected).copied().collect()
    }

    pub fn set_selected(&mut self, data: &GuideData, selected: bool) -> bool {
        let Some(guide) = self.guides.iter_mut().find(|g| g.same_line(data)) else {
            return false;
        };
        guide.selected = selected;
        true
    }

    pub fn reset_selection(&mut self) {
        for guide in &mut self.guides {
            guide.selected = false;
        }
    }

    /// Entfernt alle selektierten Guides und gibt sie zurück (für Undo).
    pub fn delete_selected_guides(&mut self) -> Vec<GuideData> {
        let removed: Vec<GuideData> = self.guides.iter().filter(|g| g.selected).copied().collect();
        self.guides.retain(|g| !g.selected);
        removed
    }

    // ── Einrasten ───────────────────────────────────────────────────

    /// Kleinste Verschiebung, die eine der `rects` auf eine Guide
    /// einrasten lässt. Ergebnis-Achsen gelten nur innerhalb der Schwelle.
    pub fn calculate_stick_to_guides(&self, rects: &[Rect]) -> StickResult {
        if !self.enabled || self.stick_mode == 0 {
            return StickResult::default();
        }

        let mut min_distance = Vec2::new(f32::MAX, f32::MAX);
        for guide in &self.guides {
            for rect in rects {
                let distance = self.distance_to_guide(guide.kind, guide.position, rect);
                if distance.x.abs() < min_distance.x.abs() {
                    min_distance.x = distance.x;
                }
                if distance.y.abs() < min_distance.y.abs() {
                    min_distance.y = distance.y;
                }
            }
        }

        self.stick_result(min_distance)
    }

    pub fn stick_mode(&self) -> u8 {
        self.stick_mode
    }

    pub fn set_stick_mode(&mut self, mode: u8) {
        self.stick_mode = mode;
    }

    pub fn stick_threshold(&self) -> f32 {
        self.stick_threshold
    }

    pub fn set_stick_threshold(&mut self, threshold: f32) {
        self.stick_threshold = threshold;
    }

    pub fn are_guides_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_guides_enabled(&mut self, value: bool) {
        self.enabled = value;
    }

    pub fn are_guides_locked(&self) -> bool {
        self.locked
    }

    pub fn lock_guides(&mut self, value: bool) {
        self.locked = value;
    }

    // ── Intern ──────────────────────────────────────────────────────

    /// Liegt `pos` (senkrecht zur Ausrichtung gemessen) auf der Guide?
    fn is_guide_on_position(&self, guide: &GuideData, pos: Vec2) -> bool {
        match guide.kind {
            GuideKind::Horizontal => (guide.position.y - pos.y).abs() < self.stick_threshold,
            GuideKind::Vertical => (guide.position.x - pos.x).abs() < self.stick_threshold,
            GuideKind::Both => {
                (guide.position.y - pos.y).abs() < self.stick_threshold
                    || (guide.position.x - pos.x).abs() < self.stick_threshold
            }
        }
    }

    /// Abstand eines Rechtecks zu einer Guide, getrennt nach Achsen.
    /// Nicht einrastende Achsen bleiben auf `f32::MAX`.
    fn distance_to_guide(&self, kind: GuideKind, guide_pos: Vec2, rect: &Rect) -> Vec2 {
        let mut min_sides = Vec2::new(f32::MAX, f32::MAX);

        if self.stick_mode & STICK_TO_SIDES != 0 {
            if matches!(kind, GuideKind::Horizontal | GuideKind::Both) {
                let to_top = rect.top() - guide_pos.y;
                let to_bottom = rect.bottom() - guide_pos.y;
                min_sides.y = if to_top.abs() < to_bottom.abs() {
                    to_top
                } else {
                    to_bottom
                };
            }
            if matches!(kind, GuideKind::Vertical | GuideKind::Both) {
                let to_left = rect.left() - guide_pos.x;
                let to_right = rect.right() - guide_pos.x;
                min_sides.x = if to_left.abs() < to_right.abs() {
                    to_left
                } else {
                    to_right
                };
            }
        }

        let mut min_centers = Vec2::new(f32::MAX, f32::MAX);
        if self.stick_mode & STICK_TO_CENTERS != 0 {
            let to_center = rect.center() - guide_pos;
            if matches!(kind, GuideKind::Horizontal | GuideKind::Both) {
                min_centers.y = to_center.y;
            }
            if matches!(kind, GuideKind::Vertical | GuideKind::Both) {
                min_centers.x = to_center.x;
            }
        }

        Vec2::new(
            if min_sides.x.abs() < min_centers.x.abs() {
                min_sides.x
            } else {
                min_centers.x
            },
            if min_sides.y.abs() < min_centers.y.abs() {
                min_sides.y
            } else {
                min_centers.y
            },
        )
    }

    fn stick_result(&self, distance: Vec2) -> StickResult {
        let mut result = StickResult::default();
        if distance.x.abs() < self.stick_threshold {
            result.offset.x = distance.x;
            result.sticked_x = true;
        }
        if distance.y.abs() < self.stick_threshold {
            result.offset.y = distance.y;
            result.sticked_y = true;
        }
        result
    }

    /// Verschiebt eine gezogene Guide auf `pos` und rastet sie dabei an
    /// den Kanten/Mittelpunkten der gemerkten Control-Rechtecke ein.
    fn move_guide_sticked(&self, guide: &mut GuideData, pos: Vec2) {
        let mut min_distance = Vec2::new(f32::MAX, f32::MAX);
        let mut closest: Option<Rect> = None;

        for rect in &self.stick_rects {
            // Nur Rechtecke in Cursor-Nähe kommen als Einrast-Ziel infrage.
            let inflated = Rect::new(
                rect.left() - self.stick_threshold / 2.0,
                rect.top() - self.stick_threshold / 2.0,
                rect.size.x + self.stick_threshold,
                rect.size.y + self.stick_threshold,
            );
            if !inflated.contains(pos) {
                continue;
            }

            let distance = self.distance_to_guide(guide.kind, pos, rect);
            if distance.x.abs() < min_distance.x.abs() {
                min_distance.x = distance.x;
                closest = Some(*rect);
            }
            if distance.y.abs() < min_distance.y.abs() {
                min_distance.y = distance.y;
                closest = Some(*rect);
            }
        }

        let result = self.stick_result(min_distance);
        guide.position = match closest {
            Some(rect) if result.sticked() => Self::closest_stick_position(&rect, pos, result),
            _ => pos,
        };
    }

    /// Wählt pro eingerasteter Achse die nächstliegende Kante bzw. Mitte
    /// des Rechtecks als Zielposition.
    fn closest_stick_position(rect: &Rect, pos: Vec2, result: StickResult) -> Vec2 {
        let mut sticked = pos;

        if result.sticked_x {
            let candidates = [rect.left(), rect.center().x, rect.right()];
            sticked.x = candidates
                .into_iter()
                .min_by(|a, b| (a - pos.x).abs().total_cmp(&(b - pos.x).abs()))
                .unwrap_or(pos.x);
        }
        if result.sticked_y {
            let candidates = [rect.top(), rect.center().y, rect.bottom()];
            sticked.y = candidates
                .into_iter()
                .min_by(|a, b| (a - pos.y).abs().total_cmp(&(b - pos.y).abs()))
                .unwrap_or(pos.y);
        }

        sticked
    }
}

impl Default for GuidesManager {
    fn default() -> Self {
        Self::new()
    }
}
