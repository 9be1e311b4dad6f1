//! Startup plan
//!
//! Builds the ordered list of programs from `[program:*]` sections. Order is
//! ascending `priority`, ties kept in configuration order, and never changes
//! after construction. Only group resolution mutates a built plan.

mod policy;

pub use policy::OrderingPolicy;

use serde::Serialize;
use tracing::warn;

use crate::config::{ConfigDocument, PROGRAM_SECTION_PREFIX};
use crate::supervisor::ProcessInfo;

/// Priority used when a program does not set one.
pub const DEFAULT_PRIORITY: i64 = 1000;

/// One configured program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Program {
    /// Name from the section header, without the `program:` prefix.
    pub name: String,
    /// Owning group, once resolved from the control plane.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Identifier accepted by the start command (`group:name` or `name`).
    pub procname: String,
    pub priority: i64,
    pub options: OrderingPolicy,
}

impl Program {
    pub fn new(name: impl Into<String>, priority: i64, options: OrderingPolicy) -> Self {
        let name = name.into();
        Self {
            procname: name.clone(),
            name,
            group: None,
            priority,
            options,
        }
    }

    /// Record the group this program belongs to. A group named after the
    /// program itself is the implicit single-program group and changes nothing.
    pub fn assign_group(&mut self, group: &str) {
        if group == self.name {
            return;
        }
        self.procname = format!("{}:{}", group, self.name);
        self.group = Some(group.to_string());
    }
}

/// Ordered programs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupPlan {
    programs: Vec<Program>,
}

impl StartupPlan {
    /// Order `programs` by priority. The sort is stable.
    pub fn new(mut programs: Vec<Program>) -> Self {
        programs.sort_by_key(|p| p.priority);
        Self { programs }
    }

    /// Build the plan from every `[program:*]` section in `document`.
    pub fn from_config(document: &ConfigDocument) -> Self {
        let programs = document
            .sections()
            .filter_map(|section| {
                let name = section.strip_prefix(PROGRAM_SECTION_PREFIX)?;
                let options = OrderingPolicy::from_section(document, section);
                let priority = match document.get_int(section, "priority") {
                    Ok(value) => value.unwrap_or(DEFAULT_PRIORITY),
                    Err(err) => {
                        warn!(
                            error = %err,
                            file = ?document.section_origin(section),
                            default = DEFAULT_PRIORITY,
                            "using default priority"
                        );
                        DEFAULT_PRIORITY
                    }
                };
                Some(Program::new(name, priority, options))
            })
            .collect();
        Self::new(programs)
    }

    /// Fill in groups from the control plane listing.
    pub fn resolve_groups(&mut self, processes: &[ProcessInfo]) {
        for process in processes.iter().filter(|p| p.name != p.group) {
            if let Some(program) = self.programs.iter_mut().find(|p| p.name == process.name) {
                program.assign_group(&process.group);
            }
        }
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn first(&self) -> Option<&Program> {
        self.programs.first()
    }

    pub fn get(&self, name: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Program names in plan order.
    pub fn names(&self) -> Vec<&str> {
        self.programs.iter().map(|p| p.name.as_str()).collect()
    }
}
