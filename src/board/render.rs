use std::fmt::Write;

use crate::aggregation::{group_by_assignee, production_summary};
use crate::models::{Item, SubtaskStatus};
use crate::pipeline::GroupKind;
use crate::reconcile::BoardSnapshot;

/// Text view of a snapshot, groups in the order the server returned them
pub fn render_board(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();

    if snapshot.is_empty() {
        out.push_str("📭 Board not loaded\n");
        return out;
    }

    for group in snapshot.groups() {
        let _ = writeln!(out, "📂 {} ({})", group.kind, group.items.len());
        if group.items.is_empty() {
            out.push_str("   (empty)\n");
        }
        for item in &group.items {
            render_item(&mut out, group.kind, item);
        }
        out.push('\n');
    }

    let problems = snapshot.inconsistencies();
    if !problems.is_empty() {
        let _ = writeln!(out, "⚠️  {} inconsistencies reported by the server data:", problems.len());
        for problem in problems {
            let _ = writeln!(out, "   - {problem}");
        }
    }

    out
}

fn render_item(out: &mut String, kind: GroupKind, item: &Item) {
    let _ = write!(
        out,
        "   #{:<4} {} | {} | {}",
        item.id, item.number, item.name, item.status
    );
    if !item.attachments.is_empty() {
        let _ = write!(out, " | 📎 {}", item.attachments.len());
    }
    out.push('\n');

    if let (Some(date), Some(who)) = (item.visit_date, item.visit_responsible.as_deref()) {
        let _ = writeln!(out, "         visit {date} with {who}");
    }
    if let (Some(entry), Some(due)) = (item.production_entry_date, item.production_due_date) {
        let _ = writeln!(out, "         production {entry} → {due}");
    }
    if let (Some(date), Some(who)) = (item.install_date, item.install_responsible.as_deref()) {
        let _ = writeln!(out, "         installation {date} with {who}");
    }
    if let Some(phase) = item.installed_phase {
        let _ = writeln!(out, "         installed {phase}");
    }

    if kind == GroupKind::Production && !item.subtasks.is_empty() {
        let summary = production_summary(item);
        let _ = writeln!(
            out,
            "         {} ({}/{} finished)",
            summary.aggregate,
            summary.count(SubtaskStatus::Finished),
            summary.total
        );
        for (assignee, tasks) in group_by_assignee(&item.subtasks) {
            let listed: Vec<String> = tasks
                .iter()
                .map(|task| format!("[{}] {} ({})", task.id, task.description, task.status))
                .collect();
            let _ = writeln!(out, "         {assignee}: {}", listed.join(", "));
        }
    }
}
