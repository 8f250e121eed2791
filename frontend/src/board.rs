//! Task list state for the tasks page.
//!
//! The board keeps the last list fetched from the server as an immutable
//! snapshot. What the page shows is derived from it by [`derive_view`] on
//! every render. Inline edits go to a separate [`EditDraft`], so the
//! snapshot only changes when the server confirms a write.

use shared::{Task, UpdateTaskRequest, ValidationErrors};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Completed, Filter::Incomplete];

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Completed => "Completed",
            Filter::Incomplete => "Incomplete",
        }
    }

    fn keeps(self, task: &Task) -> bool {
        match self {
            Filter::All => true,
            Filter::Completed => task.finished,
            Filter::Incomplete => !task.finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// What the caller has to do after a filter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEffect {
    /// `All` reloads the list from the server.
    Refetch,
    /// The view was recomputed from the snapshot.
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Viewing,
    Editing,
    /// The draft was sent and the server has not answered yet.
    Saving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub saving: bool,
}

fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.description.to_lowercase().contains(needle)
}

/// Filters, searches and sorts `snapshot` without touching it.
///
/// Sorting compares titles case-insensitively and is stable, so rows with
/// equal titles keep their server order.
pub fn derive_view<'a>(
    snapshot: &'a [Task],
    filter: Filter,
    sort: Option<SortOrder>,
    search: &str,
) -> Vec<&'a Task> {
    let needle = search.trim().to_lowercase();
    let mut view: Vec<&Task> = snapshot
        .iter()
        .filter(|t| filter.keeps(t) && matches_search(t, &needle))
        .collect();

    match sort {
        Some(SortOrder::Asc) => {
            view.sort_by_cached_key(|t| t.title.to_lowercase());
        }
        Some(SortOrder::Desc) => {
            view.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()));
        }
        None => {}
    }
    view
}

#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    snapshot: Vec<Task>,
    filter: Filter,
    sort: Option<SortOrder>,
    search: String,
    editing: Option<EditDraft>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a freshly fetched list. A draft whose task vanished is dropped.
    pub fn replace_snapshot(&mut self, tasks: Vec<Task>) {
        self.snapshot = tasks;
        let stale = self
            .editing
            .as_ref()
            .is_some_and(|draft| self.task(draft.id).is_none());
        if stale {
            self.editing = None;
        }
    }

    pub fn snapshot(&self) -> &[Task] {
        &self.snapshot
    }

    pub fn visible(&self) -> Vec<&Task> {
        derive_view(&self.snapshot, self.filter, self.sort, &self.search)
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.snapshot.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) -> FilterEffect {
        self.filter = filter;
        match filter {
            Filter::All => FilterEffect::Refetch,
            Filter::Completed | Filter::Incomplete => FilterEffect::Local,
        }
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    pub fn set_sort(&mut self, order: SortOrder) {
        self.sort = Some(order);
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: String) {
        self.search = search;
    }

    pub fn row_state(&self, id: Uuid) -> RowState {
        match &self.editing {
            Some(draft) if draft.id == id && draft.saving => RowState::Saving,
            Some(draft) if draft.id == id => RowState::Editing,
            _ => RowState::Viewing,
        }
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    /// Opens the editor for `id`, closing any other row.
    ///
    /// Unknown ids are ignored, as is any request while a save is in flight.
    pub fn begin_edit(&mut self, id: Uuid) -> bool {
        if self.editing.as_ref().is_some_and(|d| d.saving) {
            return false;
        }
        let Some(task) = self.task(id) else {
            return false;
        };
        self.editing = Some(EditDraft {
            id,
            title: task.title.clone(),
            description: task.description.clone(),
            saving: false,
        });
        true
    }

    pub fn edit_title(&mut self, title: String) {
        if let Some(draft) = self.editing.as_mut().filter(|d| !d.saving) {
            draft.title = title;
        }
    }

    pub fn edit_description(&mut self, description: String) {
        if let Some(draft) = self.editing.as_mut().filter(|d| !d.saving) {
            draft.description = description;
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Turns the draft into an update request and marks it as saving.
    ///
    /// The draft is kept until [`apply_saved`](Self::apply_saved) confirms the
    /// write or [`save_failed`](Self::save_failed) reopens it. An invalid draft
    /// stays editable and the errors are returned instead.
    pub fn commit_edit(&mut self) -> Option<Result<(Uuid, UpdateTaskRequest), ValidationErrors>> {
        let draft = self.editing.as_mut().filter(|d| !d.saving)?;
        let request = UpdateTaskRequest::text(draft.title.clone(), draft.description.clone());
        if let Err(errors) = request.validate() {
            return Some(Err(errors));
        }
        draft.saving = true;
        Some(Ok((draft.id, request)))
    }

    /// Reopens a draft whose save was rejected, keeping the typed text.
    ///
    /// Returns `false` if no save was pending for `id`.
    pub fn save_failed(&mut self, id: Uuid) -> bool {
        match self.editing.as_mut() {
            Some(draft) if draft.id == id && draft.saving => {
                draft.saving = false;
                true
            }
            _ => false,
        }
    }

    /// Replaces the snapshot row with the server's copy and closes a pending
    /// draft for it.
    pub fn apply_saved(&mut self, task: Task) {
        if self
            .editing
            .as_ref()
            .is_some_and(|d| d.id == task.id && d.saving)
        {
            self.editing = None;
        }
        if let Some(row) = self.snapshot.iter_mut().find(|t| t.id == task.id) {
            *row = task;
        }
    }

    pub fn remove(&mut self, id: Uuid) {
        self.snapshot.retain(|t| t.id != id);
        if self.editing.as_ref().is_some_and(|d| d.id == id) {
            self.editing = None;
        }
    }

    pub fn counts(&self) -> (usize, usize) {
        let done = self.snapshot.iter().filter(|t| t.finished).count();
        (self.snapshot.len() - done, done)
    }
}
