//! Text report over an exported set of task and medication rows.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::agenda::{self, ItemKind};
use crate::error::RunError;
use crate::models::records::{MedicationRecord, TaskRecord};

/// Rows as exported by the persistence layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Export {
    #[serde(rename = "tarefas", default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(rename = "medicamentos", default)]
    pub medications: Vec<MedicationRecord>,
}

pub fn load_export(path: &Path) -> Result<Export, RunError> {
    let raw = std::fs::read_to_string(path)?;
    let export: Export = serde_json::from_str(&raw)?;
    tracing::info!(
        path = %path.display(),
        tasks = export.tasks.len(),
        medications = export.medications.len(),
        "Export loaded"
    );
    Ok(export)
}

/// Next task, next dose, and the agenda for the day of `now`.
pub fn render(export: &Export, now: NaiveDateTime) -> String {
    let mut out = String::new();

    out.push_str(&match agenda::next_task(&export.tasks, now) {
        Some(next) => format!("Próxima tarefa: {} ({})\n", next.title, next.label),
        None => "Próxima tarefa: nenhuma\n".to_string(),
    });

    out.push_str(&match agenda::next_dose(&export.medications, now) {
        Some(next) => format!("Próximo medicamento: {} ({})\n", next.title, next.label),
        None => "Próximo medicamento: nenhum\n".to_string(),
    });

    let today = now.date();
    out.push_str(&format!("Agenda de {}:\n", today.format("%d/%m/%Y")));
    let entries = agenda::daily_agenda(today, today, &export.tasks, &export.medications);
    if entries.is_empty() {
        out.push_str("  (vazia)\n");
    }
    for entry in entries {
        let marker = match entry.kind {
            ItemKind::Task => "tarefa",
            ItemKind::Medication => "medicamento",
        };
        out.push_str(&format!(
            "  {} {} [{}]\n",
            entry.at.format("%H:%M"),
            entry.title,
            marker
        ));
    }

    out
}
