//! Commands zum Anlegen und Umbenennen von Nodes.
//!
//! Erstausführung legt den Node über die Baum-Fabriken an, Rollback löst
//! ihn nur aus der Szene, Redo hängt denselben Node an seiner gemerkten
//! Position wieder ein. Namensvalidierung passiert vor jeder Mutation.

use anyhow::bail;
use glam::Vec2;

use crate::app::commands::Command;
use crate::app::context::EditorContext;
use crate::app::events::EditorEvent;
use crate::core::naming::{name_exists_in_scope, name_exists_in_subtree, new_control_name};
use crate::core::node::NodeKind;
use crate::core::tree::NodePosition;
use crate::core::{NodeId, Rect};

/// Löst den Teilbaum aus der Szene und räumt die Selektion auf.
fn detach_created(ctx: &mut EditorContext, id: NodeId) {
    if ctx.selection.remove_subtree(&ctx.tree, id) > 0 {
        ctx.events.emit(EditorEvent::SelectionChanged);
    }
    ctx.tree.delete_nodes(&[id], false, true);
}

/// Hängt den gemerkten Node an seiner gemerkten Position wieder ein.
fn reattach_created(ctx: &mut EditorContext, id: NodeId, position: NodePosition) -> anyhow::Result<()> {
    if !ctx.tree.attach_node(id, position.parent, position.insert_at()) {
        bail!("Node {} lässt sich nicht wieder anhängen", id);
    }
    Ok(())
}

// ── Platform ────────────────────────────────────────────────────────

/// Legt eine neue Platform unter dem Root an.
///
/// Ohne Größe gilt die Standardgröße aus den Optionen.
pub struct CreatePlatformCommand {
    name: String,
    size: Option<Vec2>,
    created: Option<NodeId>,
    position: Option<NodePosition>,
}

impl CreatePlatformCommand {
    pub fn new(name: &str, size: Option<Vec2>) -> Self {
        Self {
            name: name.to_string(),
            size,
            created: None,
            position: None,
        }
    }

    /// Id der angelegten Platform, nach der ersten Ausführung.
    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for CreatePlatformCommand {
    fn name(&self) -> &str {
        "Platform anlegen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let (Some(id), Some(position)) = (self.created, self.position) {
            return reattach_created(ctx, id, position);
        }

        let root = ctx.tree.root_id();
        if name_exists_in_scope(&ctx.tree, root, &self.name) {
            bail!("Platform '{}' existiert bereits", self.name);
        }

        let locale = ctx.options.default_locale.clone();
        let size = self.size.unwrap_or_else(|| ctx.options.default_platform_size());
        let id = ctx.tree.add_platform(&self.name, size, &locale);
        self.created = Some(id);
        self.position = ctx.tree.node_position(id);
        log::info!("Platform '{}' angelegt ({})", self.name, id);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(id) = self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        detach_created(ctx, id);
        Ok(())
    }
}

// ── Screen ──────────────────────────────────────────────────────────

/// Legt einen neuen Screen unter einer Platform an.
pub struct CreateScreenCommand {
    platform: NodeId,
    name: String,
    created: Option<NodeId>,
    position: Option<NodePosition>,
}

impl CreateScreenCommand {
    pub fn new(platform: NodeId, name: &str) -> Self {
        Self {
            platform,
            name: name.to_string(),
            created: None,
            position: None,
        }
    }

    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for CreateScreenCommand {
    fn name(&self) -> &str {
        "Screen anlegen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let (Some(id), Some(position)) = (self.created, self.position) {
            return reattach_created(ctx, id, position);
        }

        if ctx.tree.get_node(self.platform).map(|n| n.is_platform()) != Some(true) {
            bail!("Node {} ist keine Platform", self.platform);
        }
        if name_exists_in_scope(&ctx.tree, self.platform, &self.name) {
            bail!("Screen '{}' existiert bereits", self.name);
        }

        let Some(id) = ctx.tree.add_screen(&self.name, self.platform) else {
            bail!("Screen '{}' konnte nicht angelegt werden", self.name);
        };
        ctx.apply_guide_options(id);
        self.created = Some(id);
        self.position = ctx.tree.node_position(id);
        log::info!("Screen '{}' angelegt ({})", self.name, id);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(id) = self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        detach_created(ctx, id);
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.created.into_iter().collect()
    }
}

// ── Aggregator ──────────────────────────────────────────────────────

/// Legt einen neuen Aggregator unter einer Platform an.
pub struct CreateAggregatorCommand {
    platform: NodeId,
    name: String,
    size: Vec2,
    created: Option<NodeId>,
    position: Option<NodePosition>,
}

impl CreateAggregatorCommand {
    pub fn new(platform: NodeId, name: &str, size: Vec2) -> Self {
        Self {
            platform,
            name: name.to_string(),
            size,
            created: None,
            position: None,
        }
    }

    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for CreateAggregatorCommand {
    fn name(&self) -> &str {
        "Aggregator anlegen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let (Some(id), Some(position)) = (self.created, self.position) {
            return reattach_created(ctx, id, position);
        }

        if ctx.tree.get_node(self.platform).map(|n| n.is_platform()) != Some(true) {
            bail!("Node {} ist keine Platform", self.platform);
        }
        if name_exists_in_scope(&ctx.tree, self.platform, &self.name) {
            bail!("Aggregator '{}' existiert bereits", self.name);
        }

        let Some(id) = ctx.tree.add_aggregator(&self.name, self.platform, self.size) else {
            bail!("Aggregator '{}' konnte nicht angelegt werden", self.name);
        };
        ctx.apply_guide_options(id);
        self.created = Some(id);
        self.position = ctx.tree.node_position(id);
        log::info!("Aggregator '{}' angelegt ({})", self.name, id);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(id) = self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        detach_created(ctx, id);
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.created.into_iter().collect()
    }
}

// ── Control ─────────────────────────────────────────────────────────

/// Legt ein neues Control unter einem Screen oder Control an.
///
/// Ohne Namen wird der nächste freie `Control<N>`-Name vergeben, ohne
/// Geometrie die Standardgröße aus den Optionen. Mit `template` entsteht
/// eine Aggregator-Instanz, die sofort mit dem Template abgeglichen wird.
pub struct CreateControlCommand {
    parent: NodeId,
    name: Option<String>,
    rect: Option<Rect>,
    template: Option<NodeId>,
    created: Option<NodeId>,
    position: Option<NodePosition>,
    screen: Option<NodeId>,
}

impl CreateControlCommand {
    pub fn new(parent: NodeId, name: Option<&str>, rect: Option<Rect>) -> Self {
        Self {
            parent,
            name: name.map(str::to_string),
            rect,
            template: None,
            created: None,
            position: None,
            screen: None,
        }
    }

    /// Variante für Aggregator-Instanzen aus der Template-Bibliothek.
    pub fn with_template(parent: NodeId, name: Option<&str>, template: NodeId) -> Self {
        Self {
            parent,
            name: name.map(str::to_string),
            rect: None,
            template: Some(template),
            created: None,
            position: None,
            screen: None,
        }
    }

    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }
}

impl Command for CreateControlCommand {
    fn name(&self) -> &str {
        "Control anlegen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if let (Some(id), Some(position)) = (self.created, self.position) {
            return reattach_created(ctx, id, position);
        }

        let parent_ok = ctx
            .tree
            .get_node(self.parent)
            .map(|n| n.is_screen_like() || n.is_control_like());
        if parent_ok != Some(true) {
            bail!("Node {} kann keine Controls aufnehmen", self.parent);
        }
        let Some(screen) = ctx.tree.screen_of(self.parent) else {
            bail!("Node {} liegt in keinem Screen", self.parent);
        };

        let max_attempts = ctx.options.copy_name_max_attempts;
        let name = match &self.name {
            Some(name) => {
                if name_exists_in_subtree(&ctx.tree, screen, name) {
                    bail!("Control '{}' existiert in diesem Screen bereits", name);
                }
                name.clone()
            }
            None => new_control_name(&ctx.tree, screen, "Control", max_attempts),
        };
        let rect = self.rect.unwrap_or(Rect {
            pos: Vec2::ZERO,
            size: ctx.options.default_control_size(),
        });

        let id = match self.template {
            Some(template) => {
                if ctx.tree.get_node(template).map(|n| n.is_aggregator()) != Some(true) {
                    bail!("Node {} ist kein Aggregator", template);
                }
                if screen == template {
                    bail!("Aggregator '{}' kann sich nicht selbst enthalten", template);
                }
                if ctx.tree.platform_of(template) != ctx.tree.platform_of(self.parent) {
                    bail!("Aggregator {} gehört zu einer anderen Platform", template);
                }
                let Some(id) =
                    ctx.tree
                        .create_aggregator_control(self.parent, &name, rect, template)
                else {
                    bail!("Instanz von {} konnte nicht angelegt werden", template);
                };
                ctx.tree.update_aggregator_instance(template, id);
                id
            }
            None => {
                let Some(id) = ctx.tree.create_control(self.parent, &name, rect) else {
                    bail!("Control '{}' konnte nicht angelegt werden", name);
                };
                id
            }
        };

        self.created = Some(id);
        self.position = ctx.tree.node_position(id);
        self.screen = Some(screen);
        log::info!("Control '{}' angelegt ({})", name, id);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(id) = self.created else {
            bail!("Rollback vor der ersten Ausführung");
        };
        detach_created(ctx, id);
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.screen.into_iter().collect()
    }
}

// ── Umbenennen ──────────────────────────────────────────────────────

/// Benennt einen Node um, mit Duplikatprüfung vor der Mutation.
///
/// Beim Umbenennen eines Aggregators wandert der neue Name auch in den
/// serialisierten Template-Namen aller registrierten Instanzen, damit die
/// Auflösung beim nächsten Laden stimmt.
pub struct RenameNodeCommand {
    node: NodeId,
    new_name: String,
    previous: Option<String>,
    instances: Vec<NodeId>,
    affected: Vec<NodeId>,
}

impl RenameNodeCommand {
    pub fn new(node: NodeId, new_name: &str) -> Self {
        Self {
            node,
            new_name: new_name.to_string(),
            previous: None,
            instances: Vec::new(),
            affected: Vec::new(),
        }
    }

    fn apply_name(&self, ctx: &mut EditorContext, name: &str) {
        if let Some(node) = ctx.tree.get_node_mut(self.node) {
            node.name = name.to_string();
        }
        for &instance in &self.instances {
            if let Some(NodeKind::AggregatorControl { template_name, .. }) =
                ctx.tree.get_node_mut(instance).map(|n| &mut n.kind)
            {
                *template_name = name.to_string();
            }
        }
    }
}

impl Command for RenameNodeCommand {
    fn name(&self) -> &str {
        "Node umbenennen"
    }

    fn execute(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        if self.previous.is_some() {
            let name = self.new_name.clone();
            self.apply_name(ctx, &name);
            return Ok(());
        }

        let Some(node) = ctx.tree.get_node(self.node) else {
            bail!("Node {} existiert nicht", self.node);
        };
        let Some(parent) = node.parent else {
            bail!("Root kann nicht umbenannt werden");
        };
        if node.name == self.new_name {
            bail!("Name '{}' ist unverändert", self.new_name);
        }
        if name_exists_in_scope(&ctx.tree, parent, &self.new_name) {
            bail!("Name '{}' ist bereits vergeben", self.new_name);
        }

        self.previous = Some(node.name.clone());
        self.affected = match ctx.tree.screen_of(self.node) {
            Some(screen) => vec![screen],
            None => Vec::new(),
        };
        if let NodeKind::Aggregator { instances, .. } = &node.kind {
            self.instances = instances.iter().copied().collect();
            for &instance in &self.instances {
                if let Some(screen) = ctx.tree.screen_of(instance) {
                    if !self.affected.contains(&screen) {
                        self.affected.push(screen);
                    }
                }
            }
        }

        let name = self.new_name.clone();
        self.apply_name(ctx, &name);
        log::info!("Node {} heißt jetzt '{}'", self.node, self.new_name);
        Ok(())
    }

    fn rollback(&mut self, ctx: &mut EditorContext) -> anyhow::Result<()> {
        let Some(previous) = self.previous.clone() else {
            bail!("Rollback vor der ersten Ausführung");
        };
        self.apply_name(ctx, &previous);
        Ok(())
    }

    fn affected_screens(&self) -> Vec<NodeId> {
        self.affected.clone()
    }
}
