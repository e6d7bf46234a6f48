use ebbtide_core::{LedgerEntry, MigrationStatus, MigrationView};
use serde::Serialize;

/// One reconciled migration: its output view plus its classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub migration: MigrationView,
    pub status: MigrationStatus,
}

/// Aggregate counts over the reconciled catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusSummary {
    pub applied: usize,
    pub unapplied: usize,
    pub skipped: usize,
    pub missing: usize,
    pub next: Option<String>,
}

/// Result of reconciling the registry against the ledger. Derived on every
/// invocation, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// Per-migration classification in catalog order (ledger-only rows
    /// interleaved where the walk encounters them).
    pub items: Vec<ListItem>,
    pub summary: StatusSummary,
    /// Most recently applied entry seen during the walk.
    pub last: Option<LedgerEntry>,
}

impl Status {
    /// Names still waiting to be applied, in registry order.
    pub fn pending(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|item| {
                matches!(
                    item.status,
                    MigrationStatus::Unapplied | MigrationStatus::Skipped
                )
            })
            .map(|item| item.migration.name().to_string())
            .collect()
    }
}

/// Join registry order with ledger order by name. Both sides are walked in
/// step: a name on both sides is applied; a file the ledger does not know,
/// met while applied rows remain, was skipped; a row without a file is
/// missing on disk; trailing files are ready to run.
pub fn compute_status(names: &[String], rows: &[LedgerEntry]) -> Status {
    let mut items = Vec::with_capacity(names.len().max(rows.len()));
    let mut summary = StatusSummary::default();
    let mut last = None;

    let mut fi = 0;
    let mut ri = 0;

    while fi < names.len() && ri < rows.len() {
        let file = &names[fi];
        let row = &rows[ri];

        if *file == row.name {
            items.push(ListItem {
                migration: MigrationView::from(row),
                status: MigrationStatus::Applied,
            });
            summary.applied += 1;
            last = Some(row.clone());
            fi += 1;
            ri += 1;
        } else if file.as_str() < row.name.as_str() {
            // on disk but not in the ledger while later rows exist
            items.push(ListItem {
                migration: MigrationView::unapplied(file.clone()),
                status: MigrationStatus::Skipped,
            });
            summary.skipped += 1;
            summary.unapplied += 1;
            if summary.next.is_none() {
                summary.next = Some(file.clone());
            }
            fi += 1;
        } else {
            // in the ledger but the file is gone
            items.push(ListItem {
                migration: MigrationView::from(row),
                status: MigrationStatus::Missing,
            });
            summary.missing += 1;
            summary.applied += 1;
            ri += 1;
        }
    }

    for row in &rows[ri..] {
        items.push(ListItem {
            migration: MigrationView::from(row),
            status: MigrationStatus::Applied,
        });
        summary.applied += 1;
        last = Some(row.clone());
    }

    for file in &names[fi..] {
        items.push(ListItem {
            migration: MigrationView::unapplied(file.clone()),
            status: MigrationStatus::Unapplied,
        });
        summary.unapplied += 1;
        if summary.next.is_none() {
            summary.next = Some(file.clone());
        }
    }

    Status {
        items,
        summary,
        last,
    }
}
