//! Kanban task board
//!
//! Tasks live in a single global sequence. A lane's contents are the tasks
//! whose `status` names that lane, in global-sequence order; lanes have no
//! ordering of their own. Every reorder therefore happens on the global
//! sequence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::OpsError;
use crate::models::{Lane, Task};

/// What the pointer is over when a drag hovers or drops
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Another task card
    Task(String),
    /// A lane container (typically an empty lane)
    Lane(String),
}

/// Result of finishing a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Nothing changed
    NoOp,
    /// Status changed, global order untouched
    Relabeled { from: String, to: String },
    /// Array move within the global sequence
    Moved {
        from_index: usize,
        to_index: usize,
        relabeled: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBoard {
    lanes: Vec<Lane>,
    /// Lane whose tasks count as finished
    #[serde(default = "default_done_lane")]
    done_lane: String,
    tasks: Vec<Task>,
    #[serde(default = "default_next_task_number")]
    next_task_number: u64,
}

fn default_done_lane() -> String {
    "done".to_string()
}

fn default_next_task_number() -> u64 {
    1
}

/// "done" when present, otherwise the last lane
fn pick_done_lane(lanes: &[Lane]) -> String {
    if lanes.iter().any(|l| l.id == "done") {
        return default_done_lane();
    }
    lanes.last().map_or_else(default_done_lane, |l| l.id.clone())
}

impl TaskBoard {
    /// Creates an empty board with the given ordered lanes
    pub fn new(lanes: Vec<Lane>) -> Self {
        Self {
            done_lane: pick_done_lane(&lanes),
            lanes,
            tasks: Vec::new(),
            next_task_number: 1,
        }
    }

    /// Rebuilds a board from existing tasks, keeping their order. The id
    /// counter resumes after the highest numeric `t<N>` id present.
    pub fn restore(lanes: Vec<Lane>, tasks: Vec<Task>) -> Self {
        let next_task_number = tasks
            .iter()
            .filter_map(|t| t.id.strip_prefix('t').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .map_or(1, |n| n + 1);
        Self {
            done_lane: pick_done_lane(&lanes),
            lanes,
            tasks,
            next_task_number,
        }
    }

    pub fn done_lane(&self) -> &str {
        &self.done_lane
    }

    pub fn set_done_lane(&mut self, lane_id: &str) -> Result<(), OpsError> {
        if !self.has_lane(lane_id) {
            return Err(OpsError::UnknownLane(lane_id.to_string()));
        }
        self.done_lane = lane_id.to_string();
        Ok(())
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// The global task sequence
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn first_lane_id(&self) -> Option<&str> {
        self.lanes.first().map(|l| l.id.as_str())
    }

    pub fn has_lane(&self, lane_id: &str) -> bool {
        self.lanes.iter().any(|l| l.id == lane_id)
    }

    pub fn lane(&self, lane_id: &str) -> Option<&Lane> {
        self.lanes.iter().find(|l| l.id == lane_id)
    }

    pub fn get_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    /// Appends a new task to the first lane and returns its id
    pub fn add_task(&mut self, content: String, milestone: String, assignee: String) -> Result<String, OpsError> {
        let status = self
            .first_lane_id()
            .ok_or_else(|| OpsError::InvalidConfig("board has no lanes".to_string()))?
            .to_string();

        let id = format!("t{}", self.next_task_number);
        self.next_task_number += 1;

        log::info!("Added task {} to lane {}", id, status);
        self.tasks.push(Task {
            id: id.clone(),
            content,
            status,
            milestone,
            assignee,
        });
        Ok(id)
    }

    /// Tasks in a lane, in global-sequence order
    pub fn tasks_in_lane(&self, lane_id: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == lane_id).collect()
    }

    /// Number of tasks per lane, in lane order
    pub fn lane_counts(&self) -> Vec<(&Lane, usize)> {
        self.lanes
            .iter()
            .map(|lane| (lane, self.tasks.iter().filter(|t| t.status == lane.id).count()))
            .collect()
    }

    /// Places a task at `index` within `lane_id`, relabeling it if it comes
    /// from another lane. An index past the end of the lane appends to it.
    ///
    /// Returns `Ok(false)` when the task does not exist.
    pub fn move_task(&mut self, task_id: &str, lane_id: &str, index: usize) -> Result<bool, OpsError> {
        if !self.has_lane(lane_id) {
            return Err(OpsError::UnknownLane(lane_id.to_string()));
        }
        let Some(pos) = self.position(task_id) else {
            return Ok(false);
        };

        let mut task = self.tasks.remove(pos);
        let from = std::mem::replace(&mut task.status, lane_id.to_string());

        let lane_positions: Vec<usize> = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == lane_id)
            .map(|(i, _)| i)
            .collect();

        let insert_at = match lane_positions.get(index) {
            Some(&i) => i,
            // Past the end: right after the lane's last task, or where the
            // task already was if the lane is empty
            None => lane_positions.last().map_or(pos, |&i| i + 1),
        };

        log::debug!(
            "Moved task {} from {} to {}[{}] (global {} -> {})",
            task_id,
            from,
            lane_id,
            index,
            pos,
            insert_at
        );
        self.tasks.insert(insert_at, task);
        Ok(true)
    }

    /// Hover preview: while dragging `active_id` over a task or lane of a
    /// different lane, relabel it immediately. Returns true if the status
    /// changed. Preview relabels are never rolled back.
    pub fn drag_over(&mut self, active_id: &str, target: &DropTarget) -> bool {
        let target_lane = match target {
            DropTarget::Task(over_id) => {
                if over_id == active_id {
                    return false;
                }
                match self.get_task(over_id) {
                    Some(over) => over.status.clone(),
                    None => return false,
                }
            }
            DropTarget::Lane(lane_id) => {
                if !self.has_lane(lane_id) {
                    return false;
                }
                lane_id.clone()
            }
        };

        match self.tasks.iter_mut().find(|t| t.id == active_id) {
            Some(active) if active.status != target_lane => {
                log::debug!("Preview relabel {} {} -> {}", active_id, active.status, target_lane);
                active.status = target_lane;
                true
            }
            _ => false,
        }
    }

    /// Finishes a drag of `active_id`.
    ///
    /// - over another task: array move to that task's global index, taking
    ///   its lane
    /// - over a lane: relabel only
    /// - no target, onto itself, or unknown ids: no change
    pub fn drag_end(&mut self, active_id: &str, target: Option<&DropTarget>) -> DragOutcome {
        let Some(target) = target else {
            return DragOutcome::NoOp;
        };

        match target {
            DropTarget::Task(over_id) => {
                if over_id == active_id {
                    return DragOutcome::NoOp;
                }
                let (Some(old_index), Some(new_index)) = (self.position(active_id), self.position(over_id)) else {
                    return DragOutcome::NoOp;
                };
                let over_status = self.tasks[new_index].status.clone();

                let mut task = self.tasks.remove(old_index);
                let relabeled = task.status != over_status;
                if relabeled {
                    task.status = over_status;
                }
                self.tasks.insert(new_index, task);

                log::debug!("Dropped {} at global {} (from {})", active_id, new_index, old_index);
                DragOutcome::Moved {
                    from_index: old_index,
                    to_index: new_index,
                    relabeled,
                }
            }
            DropTarget::Lane(lane_id) => {
                if !self.has_lane(lane_id) {
                    return DragOutcome::NoOp;
                }
                match self.tasks.iter_mut().find(|t| t.id == active_id) {
                    Some(task) if task.status != *lane_id => {
                        let from = std::mem::replace(&mut task.status, lane_id.clone());
                        log::debug!("Dropped {} on lane {} (from {})", active_id, lane_id, from);
                        DragOutcome::Relabeled {
                            from,
                            to: lane_id.clone(),
                        }
                    }
                    _ => DragOutcome::NoOp,
                }
            }
        }
    }

    pub fn done_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status == self.done_lane).count()
    }

    /// Open (not done) task counts per assignee, derived from the board.
    /// This is a projection only; team members keep their own manual count.
    pub fn open_tasks_by_assignee(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for task in self.tasks.iter().filter(|t| t.status != self.done_lane) {
            *counts.entry(task.assignee.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// An in-progress drag gesture. Tracks the active card between pointer
/// events; dropping or cancelling consumes it.
#[derive(Debug)]
pub struct DragSession {
    active_id: String,
}

impl DragSession {
    /// Starts dragging `task_id`, or returns None if the board has no such task
    pub fn begin(board: &TaskBoard, task_id: &str) -> Option<Self> {
        board.get_task(task_id).map(|_| Self {
            active_id: task_id.to_string(),
        })
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn hover(&self, board: &mut TaskBoard, target: &DropTarget) -> bool {
        board.drag_over(&self.active_id, target)
    }

    pub fn drop_on(self, board: &mut TaskBoard, target: Option<&DropTarget>) -> DragOutcome {
        board.drag_end(&self.active_id, target)
    }

    /// Abandons the drag. Statuses set by earlier hovers stay as they are.
    pub fn cancel(self) {
        log::debug!("Drag of {} cancelled", self.active_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_lanes;

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            content: format!("Task {}", id),
            status: status.to_string(),
            milestone: "MVP".to_string(),
            assignee: "AF".to_string(),
        }
    }

    fn sample_board() -> TaskBoard {
        TaskBoard::restore(
            default_lanes(),
            vec![
                task("t1", "done"),
                task("t2", "done"),
                task("t3", "in-progress"),
                task("t4", "todo"),
                task("t5", "todo"),
                task("t6", "backlog"),
                task("t7", "backlog"),
            ],
        )
    }

    fn lane_ids(board: &TaskBoard, lane: &str) -> Vec<String> {
        board.tasks_in_lane(lane).iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_add_task_enters_first_lane() {
        let mut board = sample_board();
        let id = board
            .add_task("Write docs".into(), "Beta".into(), "SE".into())
            .unwrap();

        assert_eq!(id, "t8");
        let added = board.tasks().last().unwrap();
        assert_eq!(added.id, id);
        assert_eq!(added.status, "backlog");
        assert_eq!(lane_ids(&board, "backlog"), vec!["t6", "t7", "t8"]);
    }

    #[test]
    fn test_add_task_ids_are_unique() {
        let mut board = TaskBoard::new(default_lanes());
        let a = board.add_task("A".into(), "MVP".into(), "AF".into()).unwrap();
        let b = board.add_task("B".into(), "MVP".into(), "AF".into()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_add_task_without_lanes_fails() {
        let mut board = TaskBoard::new(Vec::new());
        assert!(board.add_task("A".into(), "MVP".into(), "AF".into()).is_err());
        assert!(board.tasks().is_empty());
    }

    #[test]
    fn test_tasks_in_lane_follows_global_order() {
        let board = sample_board();
        assert_eq!(lane_ids(&board, "todo"), vec!["t4", "t5"]);
        assert_eq!(lane_ids(&board, "done"), vec!["t1", "t2"]);
        assert!(board.tasks_in_lane("nope").is_empty());
    }

    #[test]
    fn test_move_todo_to_done_at_front() {
        let mut board = sample_board();
        assert!(board.move_task("t4", "done", 0).unwrap());

        let done = board.tasks_in_lane("done");
        assert_eq!(done[0].id, "t4");
        assert_eq!(done[0].status, "done");
        assert_eq!(lane_ids(&board, "done"), vec!["t4", "t1", "t2"]);
        assert_eq!(lane_ids(&board, "todo"), vec!["t5"]);
        assert_eq!(board.tasks().len(), 7);
    }

    #[test]
    fn test_move_within_lane_reorders() {
        let mut board = sample_board();
        board.move_task("t7", "backlog", 0).unwrap();
        assert_eq!(lane_ids(&board, "backlog"), vec!["t7", "t6"]);

        board.move_task("t7", "backlog", 1).unwrap();
        assert_eq!(lane_ids(&board, "backlog"), vec!["t6", "t7"]);
    }

    #[test]
    fn test_move_past_end_appends_to_lane() {
        let mut board = sample_board();
        board.move_task("t6", "done", 99).unwrap();
        assert_eq!(lane_ids(&board, "done"), vec!["t1", "t2", "t6"]);
    }

    #[test]
    fn test_move_into_empty_lane() {
        let mut board = TaskBoard::restore(default_lanes(), vec![task("t1", "backlog"), task("t2", "backlog")]);
        board.move_task("t2", "in-progress", 0).unwrap();
        assert_eq!(lane_ids(&board, "in-progress"), vec!["t2"]);
        assert_eq!(lane_ids(&board, "backlog"), vec!["t1"]);
    }

    #[test]
    fn test_move_unknown_lane_and_task() {
        let mut board = sample_board();
        assert_eq!(
            board.move_task("t1", "shipped", 0),
            Err(OpsError::UnknownLane("shipped".into()))
        );
        assert_eq!(board.move_task("t99", "done", 0), Ok(false));
        assert_eq!(lane_ids(&board, "done"), vec!["t1", "t2"]);
    }

    #[test]
    fn test_hover_over_task_in_other_lane_relabels_immediately() {
        let mut board = sample_board();
        let changed = board.drag_over("t6", &DropTarget::Task("t4".into()));

        assert!(changed);
        assert_eq!(board.get_task("t6").unwrap().status, "todo");
        // Order is untouched by the preview
        assert_eq!(board.tasks()[5].id, "t6");
    }

    #[test]
    fn test_hover_same_lane_or_self_is_noop() {
        let mut board = sample_board();
        assert!(!board.drag_over("t4", &DropTarget::Task("t5".into())));
        assert!(!board.drag_over("t4", &DropTarget::Task("t4".into())));
        assert!(!board.drag_over("t4", &DropTarget::Task("missing".into())));
        assert_eq!(board.get_task("t4").unwrap().status, "todo");
    }

    #[test]
    fn test_cancelled_drag_keeps_preview_status() {
        let mut board = sample_board();
        let session = DragSession::begin(&board, "t6").unwrap();
        session.hover(&mut board, &DropTarget::Task("t1".into()));
        session.cancel();

        assert_eq!(board.get_task("t6").unwrap().status, "done");
    }

    #[test]
    fn test_drop_without_target_keeps_preview_status() {
        let mut board = sample_board();
        let session = DragSession::begin(&board, "t6").unwrap();
        session.hover(&mut board, &DropTarget::Lane("in-progress".into()));
        let before: Vec<Task> = board.tasks().to_vec();

        assert_eq!(session.drop_on(&mut board, None), DragOutcome::NoOp);
        assert_eq!(board.tasks(), before.as_slice());
        assert_eq!(board.get_task("t6").unwrap().status, "in-progress");
    }

    #[test]
    fn test_drop_on_task_performs_array_move_and_relabel() {
        let mut board = sample_board();
        // t7 (backlog, index 6) dropped on t3 (in-progress, index 2)
        let outcome = board.drag_end("t7", Some(&DropTarget::Task("t3".into())));

        assert_eq!(
            outcome,
            DragOutcome::Moved {
                from_index: 6,
                to_index: 2,
                relabeled: true
            }
        );
        let ids: Vec<&str> = board.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t7", "t3", "t4", "t5", "t6"]);
        assert_eq!(board.get_task("t7").unwrap().status, "in-progress");
        assert_eq!(lane_ids(&board, "in-progress"), vec!["t7", "t3"]);
    }

    #[test]
    fn test_drop_after_hover_moves_without_second_relabel() {
        let mut board = sample_board();
        let session = DragSession::begin(&board, "t1").unwrap();
        session.hover(&mut board, &DropTarget::Task("t5".into()));
        let outcome = session.drop_on(&mut board, Some(&DropTarget::Task("t5".into())));

        assert_eq!(
            outcome,
            DragOutcome::Moved {
                from_index: 0,
                to_index: 4,
                relabeled: false
            }
        );
        assert_eq!(lane_ids(&board, "todo"), vec!["t4", "t5", "t1"]);
        assert_eq!(lane_ids(&board, "done"), vec!["t2"]);
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let mut board = sample_board();
        let outcome = board.drag_end("t3", Some(&DropTarget::Task("t3".into())));
        assert_eq!(outcome, DragOutcome::NoOp);
        assert_eq!(board.tasks()[2].id, "t3");
    }

    #[test]
    fn test_drop_on_empty_lane_relabels_only() {
        let mut board = TaskBoard::restore(
            default_lanes(),
            vec![task("t1", "backlog"), task("t2", "backlog"), task("t3", "todo")],
        );
        let outcome = board.drag_end("t1", Some(&DropTarget::Lane("done".into())));

        assert_eq!(
            outcome,
            DragOutcome::Relabeled {
                from: "backlog".into(),
                to: "done".into()
            }
        );
        let ids: Vec<&str> = board.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
        assert_eq!(lane_ids(&board, "done"), vec!["t1"]);
    }

    #[test]
    fn test_drop_on_unknown_lane_is_noop() {
        let mut board = sample_board();
        assert_eq!(
            board.drag_end("t1", Some(&DropTarget::Lane("archive".into()))),
            DragOutcome::NoOp
        );
        assert_eq!(board.get_task("t1").unwrap().status, "done");
    }

    #[test]
    fn test_begin_unknown_task() {
        let board = sample_board();
        assert!(DragSession::begin(&board, "t42").is_none());
    }

    #[test]
    fn test_restore_resumes_id_counter() {
        let mut board = TaskBoard::restore(default_lanes(), vec![task("t3", "todo"), task("custom", "todo")]);
        assert_eq!(board.add_task("x".into(), "MVP".into(), "AF".into()).unwrap(), "t4");
    }

    #[test]
    fn test_open_tasks_by_assignee() {
        let mut board = sample_board();
        board.add_task("x".into(), "MVP".into(), "SE".into()).unwrap();
        let counts = board.open_tasks_by_assignee();
        assert_eq!(counts.get("AF"), Some(&5));
        assert_eq!(counts.get("SE"), Some(&1));
        assert_eq!(board.done_count(), 2);
    }

    #[test]
    fn test_done_lane_selection() {
        assert_eq!(sample_board().done_lane(), "done");

        let lanes = vec![Lane::new("ideas", "Ideas"), Lane::new("shipped", "Shipped")];
        let mut board = TaskBoard::new(lanes);
        assert_eq!(board.done_lane(), "shipped");
        assert!(board.set_done_lane("ideas").is_ok());
        assert_eq!(board.done_lane(), "ideas");
        assert!(board.set_done_lane("done").is_err());
    }

    #[test]
    fn test_lane_counts_in_lane_order() {
        let board = sample_board();
        let counts: Vec<(String, usize)> = board
            .lane_counts()
            .into_iter()
            .map(|(lane, n)| (lane.id.clone(), n))
            .collect();
        assert_eq!(
            counts,
            vec![
                ("backlog".to_string(), 2),
                ("todo".to_string(), 2),
                ("in-progress".to_string(), 1),
                ("done".to_string(), 2)
            ]
        );
    }
}
