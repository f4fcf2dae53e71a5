//! Maps a drag-and-drop move made on the projected view back onto the
//! canonical store order.
//!
//! Every projected task is ranked by its index in the reordered projection,
//! every hidden task by its original canonical index. The store is then
//! sorted by (rank, original index).

use std::collections::HashMap;

use tracing::{
  debug,
  trace
};

use crate::task::{
  Task,
  TaskId
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
  /// The drag ended outside a drop target.
  Cancelled,
  SourceOutOfRange,
  Applied {
    source:      usize,
    destination: usize
  }
}

impl ReorderOutcome {
  #[must_use]
  pub const fn is_applied(self) -> bool {
    matches!(self, Self::Applied { .. })
  }
}

/// Moves the projected entry at `source` to `destination` and rewrites
/// `tasks` accordingly. `projected` is the id sequence currently on screen.
///
/// A destination past the end of the projection is clamped to its last
/// position. Anything other than `Applied` leaves `tasks` untouched.
#[tracing::instrument(skip(tasks, projected), fields(visible = projected.len()))]
pub fn reconcile(
  tasks: &mut Vec<Task>,
  projected: &[TaskId],
  source: usize,
  destination: Option<usize>
) -> ReorderOutcome {
  let Some(destination) = destination
  else {
    debug!("drag cancelled, store unchanged");
    return ReorderOutcome::Cancelled;
  };

  if source >= projected.len() {
    debug!(
      source,
      "drag source outside projection"
    );
    return ReorderOutcome::SourceOutOfRange;
  }

  let destination = destination
    .min(projected.len().saturating_sub(1));

  let mut order = projected.to_vec();
  let moved = order.remove(source);
  order.insert(destination, moved);

  let rank_of: HashMap<TaskId, usize> =
    order
      .iter()
      .enumerate()
      .map(|(rank, id)| (*id, rank))
      .collect();

  let mut ranked: Vec<(usize, usize, Task)> =
    tasks
      .drain(..)
      .enumerate()
      .map(|(original, task)| {
        let rank = rank_of
          .get(&task.id)
          .copied()
          .unwrap_or(original);
        (rank, original, task)
      })
      .collect();
  ranked.sort_by_key(|(rank, original, _)| {
    (*rank, *original)
  });
  tasks.extend(
    ranked
      .into_iter()
      .map(|(_, _, task)| task)
  );

  trace!(
    order = ?tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
    "reconciled canonical order"
  );

  ReorderOutcome::Applied {
    source,
    destination
  }
}
