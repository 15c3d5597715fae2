//! Directory query controller: view state plus the three query modes that feed it.
//!
//! Every faculty-affecting query takes a fresh [`Ticket`]. When a read settles,
//! its rows are applied only if that ticket is still the latest one issued, so
//! a slow answer to an old keystroke can never replace a newer result. The
//! department list has its own ticket because only [`DirectoryController::load_all`]
//! writes it.

use std::sync::Arc;

use shared::{
    domain::{DepartmentRecord, DirectorySummary, FacultyRecord},
    error::ReadFailure,
    query::{DepartmentSelection, FacultyQuery},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::store::RecordStore;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Faculty,
    Departments,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Displayed records, ordered by name.
    pub faculty: Vec<FacultyRecord>,
    /// Every department, ordered by name, for the filter dropdown.
    pub departments: Vec<DepartmentRecord>,
    pub loading: bool,
    pub search_text: String,
    pub selection: DepartmentSelection,
}

impl ViewState {
    pub fn summary(&self) -> DirectorySummary {
        DirectorySummary::from_records(&self.faculty, &self.departments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEvent {
    QueryIssued {
        ticket: Ticket,
        mode: &'static str,
    },
    FacultyReplaced {
        ticket: Ticket,
        count: usize,
    },
    DepartmentsReplaced {
        ticket: Ticket,
        count: usize,
    },
    ReadFailed {
        ticket: Ticket,
        collection: Collection,
        failure: ReadFailure,
    },
    StaleResponseDiscarded {
        ticket: Ticket,
        collection: Collection,
    },
    Settled {
        ticket: Ticket,
    },
    InvalidSelection(String),
}

/// Input that caused a query, stored alongside its ticket.
enum Intent {
    Reload,
    Search(String),
    Select(DepartmentSelection),
}

struct ControllerState {
    view: ViewState,
    last_issued: u64,
    latest_faculty: Ticket,
    latest_departments: Ticket,
}

pub struct DirectoryController {
    store: Arc<dyn RecordStore>,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<DirectoryEvent>,
}

impl DirectoryController {
    pub fn new(store: Arc<dyn RecordStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            store,
            state: Mutex::new(ControllerState {
                view: ViewState::default(),
                last_issued: 0,
                latest_faculty: Ticket::default(),
                latest_departments: Ticket::default(),
            }),
            events,
        })
    }

    /// Builds the controller and runs the initial full load.
    pub async fn mount(store: Arc<dyn RecordStore>) -> Arc<Self> {
        let controller = Self::new(store);
        controller.load_all().await;
        controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.state.lock().await.view.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.view.loading
    }

    pub async fn summary(&self) -> DirectorySummary {
        self.state.lock().await.view.summary()
    }

    /// Reads every faculty record and every department concurrently. Each
    /// collection is replaced independently of the other's outcome.
    pub async fn load_all(&self) {
        self.run_full_load(Intent::Reload).await;
    }

    async fn run_full_load(&self, intent: Intent) {
        let query = FacultyQuery::All;
        let ticket = self.issue(&query, Collection::Departments, intent).await;

        let (faculty, departments) = futures::join!(
            self.store.query_faculty(&query),
            self.store.query_departments()
        );

        let mut state = self.state.lock().await;
        self.apply_faculty(&mut state, ticket, faculty);
        self.apply_departments(&mut state, ticket, departments);
        self.settle(&mut state, ticket);
    }

    /// Free-text search over name, email and designation. Terms shorter than
    /// two characters fall back to [`Self::load_all`].
    pub async fn search(&self, term: &str) {
        let intent = Intent::Search(term.to_string());
        match FacultyQuery::for_search(term) {
            FacultyQuery::All => self.run_full_load(intent).await,
            query => self.run_faculty_query(query, intent).await,
        }
    }

    pub async fn filter_by_department(&self, selection: DepartmentSelection) {
        let intent = Intent::Select(selection);
        match FacultyQuery::for_selection(selection) {
            FacultyQuery::All => self.run_full_load(intent).await,
            query => self.run_faculty_query(query, intent).await,
        }
    }

    /// Dropdown entry point taking the raw option value (`all` or an id).
    pub async fn filter_by_department_value(&self, value: &str) {
        match value.parse::<DepartmentSelection>() {
            Ok(selection) => self.filter_by_department(selection).await,
            Err(err) => {
                warn!("directory: ignoring department selection: {err}");
                self.emit(DirectoryEvent::InvalidSelection(value.to_string()));
            }
        }
    }

    async fn run_faculty_query(&self, query: FacultyQuery, intent: Intent) {
        let ticket = self.issue(&query, Collection::Faculty, intent).await;
        let faculty = self.store.query_faculty(&query).await;

        let mut state = self.state.lock().await;
        self.apply_faculty(&mut state, ticket, faculty);
        self.settle(&mut state, ticket);
    }

    /// Takes the next ticket, records the user input behind it and marks the
    /// view as loading, all under one lock. `Departments` claims both
    /// collections.
    async fn issue(&self, query: &FacultyQuery, scope: Collection, intent: Intent) -> Ticket {
        let mut state = self.state.lock().await;
        match intent {
            Intent::Reload => {}
            Intent::Search(term) => state.view.search_text = term,
            Intent::Select(selection) => state.view.selection = selection,
        }
        state.last_issued += 1;
        let ticket = Ticket(state.last_issued);
        state.latest_faculty = ticket;
        if scope == Collection::Departments {
            state.latest_departments = ticket;
        }
        state.view.loading = true;
        info!(ticket = ticket.0, mode = query.mode(), "directory: query issued");
        self.emit(DirectoryEvent::QueryIssued {
            ticket,
            mode: query.mode(),
        });
        ticket
    }

    fn apply_faculty(
        &self,
        state: &mut ControllerState,
        ticket: Ticket,
        result: Result<Vec<FacultyRecord>, ReadFailure>,
    ) {
        match result {
            Ok(_) if ticket != state.latest_faculty => {
                self.discard(ticket, Collection::Faculty);
            }
            Ok(faculty) => {
                let count = faculty.len();
                state.view.faculty = faculty;
                debug!(ticket = ticket.0, count, "directory: faculty replaced");
                self.emit(DirectoryEvent::FacultyReplaced { ticket, count });
            }
            Err(failure) => self.report(ticket, Collection::Faculty, failure),
        }
    }

    fn apply_departments(
        &self,
        state: &mut ControllerState,
        ticket: Ticket,
        result: Result<Vec<DepartmentRecord>, ReadFailure>,
    ) {
        match result {
            Ok(_) if ticket != state.latest_departments => {
                self.discard(ticket, Collection::Departments);
            }
            Ok(departments) => {
                let count = departments.len();
                state.view.departments = departments;
                debug!(ticket = ticket.0, count, "directory: departments replaced");
                self.emit(DirectoryEvent::DepartmentsReplaced { ticket, count });
            }
            Err(failure) => self.report(ticket, Collection::Departments, failure),
        }
    }

    /// Only the latest faculty query may end the loading phase.
    fn settle(&self, state: &mut ControllerState, ticket: Ticket) {
        if ticket != state.latest_faculty {
            return;
        }
        state.view.loading = false;
        self.emit(DirectoryEvent::Settled { ticket });
    }

    fn discard(&self, ticket: Ticket, collection: Collection) {
        debug!(
            ticket = ticket.0,
            ?collection,
            "directory: discarded response to superseded query"
        );
        self.emit(DirectoryEvent::StaleResponseDiscarded { ticket, collection });
    }

    fn report(&self, ticket: Ticket, collection: Collection, failure: ReadFailure) {
        warn!(
            ticket = ticket.0,
            ?collection,
            "directory: read failed, keeping previous records: {failure}"
        );
        self.emit(DirectoryEvent::ReadFailed {
            ticket,
            collection,
            failure,
        });
    }

    fn emit(&self, event: DirectoryEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
