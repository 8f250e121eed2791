use std::collections::HashSet;

use sauron::{
    html::{attributes::*, *},
    prelude::*,
};
use shared::{LoginData, Task, UpdateTaskRequest};
use uuid::Uuid;
use web_sys::{console, window};

pub mod api;
pub mod board;
pub mod forms;
pub mod session;

use api::ClientError;
use board::{Filter, FilterEffect, RowState, SortOrder, TaskBoard};
use forms::{LoginForm, NewTaskForm};
use session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Tasks,
}

impl Page {
    fn to_path(self) -> &'static str {
        match self {
            Page::Login => "/login",
            Page::Tasks => "/tasks",
        }
    }

    fn from_path(path: &str, signed_in: bool) -> Self {
        match path {
            "/login" => Page::Login,
            "/tasks" => Page::Tasks,
            _ if signed_in => Page::Tasks,
            _ => Page::Login,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    NavigateTo(Page),

    // Login
    SetEmail(String),
    SetPassword(String),
    TogglePasswordVisibility,
    SubmitLogin,
    LoggedIn(LoginData),
    LoginFailed(ClientError),
    Logout,
    LoggedOut,

    // Task list
    FetchTasks,
    TasksFetched(Vec<Task>),
    SetFilter(Filter),
    SetSort(SortOrder),
    SetSearch(String),

    // New task
    SetNewTitle(String),
    SetNewDescription(String),
    SetNewDueDate(String),
    CreateTask,
    TaskCreated,

    // Row actions
    EditTask(Uuid),
    SetEditTitle(String),
    SetEditDescription(String),
    SaveEdit,
    CancelEdit,
    CompleteTask(Uuid),
    TaskSaved(Task),
    DeleteTask(Uuid),
    TaskDeleted(Uuid),

    RequestFailed {
        context: &'static str,
        task: Option<Uuid>,
        error: ClientError,
    },
}

#[derive(Debug, Clone)]
pub struct Model {
    page: Page,
    session: Option<Session>,
    board: TaskBoard,
    login: LoginForm,
    new_task: NewTaskForm,
    edit_error: Option<String>,
    loading: bool,
    busy: HashSet<Uuid>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            page: Page::Login,
            session: None,
            board: TaskBoard::new(),
            login: LoginForm::default(),
            new_task: NewTaskForm::default(),
            edit_error: None,
            loading: false,
            busy: HashSet::new(),
        }
    }
}

fn failed(context: &'static str, task: Option<Uuid>, error: ClientError) -> Msg {
    Msg::RequestFailed {
        context,
        task,
        error,
    }
}

fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

fn set_location(page: Page, replace: bool) {
    let Some(history) = window().and_then(|w| w.history().ok()) else {
        return;
    };
    let path = Some(page.to_path());
    let result = if replace {
        history.replace_state_with_url(&wasm_bindgen::JsValue::NULL, "", path)
    } else {
        history.push_state_with_url(&wasm_bindgen::JsValue::NULL, "", path)
    };
    if result.is_err() {
        console::error_1(&format!("Failed to update location to {}", page.to_path()).into());
    }
}

impl Application for Model {
    type MSG = Msg;

    fn init(&mut self) -> Cmd<Msg> {
        self.session = Session::load();
        let pathname = window()
            .and_then(|w| w.location().pathname().ok())
            .unwrap_or_default();
        self.page = Page::from_path(&pathname, self.session.is_some());
        set_location(self.page, true);

        if self.page == Page::Tasks {
            Cmd::new(async { Msg::FetchTasks })
        } else {
            Cmd::none()
        }
    }

    fn update(&mut self, msg: Msg) -> Cmd<Msg> {
        match msg {
            Msg::NavigateTo(page) => {
                self.page = page;
                set_location(page, false);
                if page == Page::Tasks {
                    Cmd::new(async { Msg::FetchTasks })
                } else {
                    Cmd::none()
                }
            }

            Msg::SetEmail(email) => {
                self.login.email = email;
                Cmd::none()
            }
            Msg::SetPassword(password) => {
                self.login.password = password;
                Cmd::none()
            }
            Msg::TogglePasswordVisibility => {
                self.login.password_visible = !self.login.password_visible;
                Cmd::none()
            }
            Msg::SubmitLogin => {
                let Some(credentials) = self.login.submit() else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    match api::login(credentials).await {
                        Ok(login_data) => Msg::LoggedIn(login_data),
                        Err(e) => Msg::LoginFailed(e),
                    }
                })
            }
            Msg::LoggedIn(login_data) => {
                let session = Session::new(login_data.token, login_data.user.id);
                session.save();
                self.session = Some(session);
                self.login.succeeded();
                Cmd::new(async { Msg::NavigateTo(Page::Tasks) })
            }
            Msg::LoginFailed(error) => {
                error.log("Login");
                let message = match &error {
                    ClientError::Response { .. } => error.to_string(),
                    _ => "Could not reach the server. Try again.".to_string(),
                };
                self.login.failed(message);
                Cmd::none()
            }
            Msg::Logout => {
                let session = self.session.take();
                Session::clear();
                self.board = TaskBoard::new();
                self.busy.clear();
                self.page = Page::Login;
                set_location(Page::Login, false);
                match session {
                    Some(session) => Cmd::new(async move {
                        if let Err(e) = api::logout(&session).await {
                            e.log("Logout");
                        }
                        Msg::LoggedOut
                    }),
                    None => Cmd::none(),
                }
            }
            Msg::LoggedOut => Cmd::none(),

            Msg::FetchTasks => {
                let Some(session) = self.session.clone() else {
                    // No token: straight to the login page, no request.
                    self.page = Page::Login;
                    set_location(Page::Login, true);
                    return Cmd::none();
                };
                self.loading = true;
                Cmd::new(async move {
                    match api::fetch_user_tasks(&session).await {
                        Ok(tasks) => Msg::TasksFetched(tasks),
                        Err(e) => failed("Fetching tasks", None, e),
                    }
                })
            }
            Msg::TasksFetched(tasks) => {
                self.loading = false;
                self.board.replace_snapshot(tasks);
                Cmd::none()
            }
            Msg::SetFilter(filter) => match self.board.set_filter(filter) {
                FilterEffect::Refetch => Cmd::new(async { Msg::FetchTasks }),
                FilterEffect::Local => Cmd::none(),
            },
            Msg::SetSort(order) => {
                self.board.set_sort(order);
                Cmd::none()
            }
            Msg::SetSearch(search) => {
                self.board.set_search(search);
                Cmd::none()
            }

            Msg::SetNewTitle(task_title) => {
                self.new_task.title = task_title;
                Cmd::none()
            }
            Msg::SetNewDescription(description) => {
                self.new_task.description = description;
                Cmd::none()
            }
            Msg::SetNewDueDate(due_date) => {
                self.new_task.due_date = due_date;
                Cmd::none()
            }
            Msg::CreateTask => {
                let Some(session) = self.session.clone() else {
                    return Cmd::new(async { Msg::FetchTasks });
                };
                let Some(request) = self.new_task.submit() else {
                    return Cmd::none();
                };
                Cmd::new(async move {
                    match api::create_task(&session, request).await {
                        Ok(_) => Msg::TaskCreated,
                        Err(e) => failed("Creating task", None, e),
                    }
                })
            }
            Msg::TaskCreated => Cmd::new(async { Msg::FetchTasks }),

            Msg::EditTask(id) => {
                self.edit_error = None;
                self.board.begin_edit(id);
                Cmd::none()
            }
            Msg::SetEditTitle(edit_title) => {
                self.board.edit_title(edit_title);
                Cmd::none()
            }
            Msg::SetEditDescription(description) => {
                self.board.edit_description(description);
                Cmd::none()
            }
            Msg::CancelEdit => {
                self.edit_error = None;
                self.board.cancel_edit();
                Cmd::none()
            }
            Msg::SaveEdit => {
                let Some(session) = self.session.clone() else {
                    return Cmd::new(async { Msg::FetchTasks });
                };
                match self.board.commit_edit() {
                    None => Cmd::none(),
                    Some(Err(errors)) => {
                        self.edit_error = Some(errors.to_string());
                        Cmd::none()
                    }
                    Some(Ok((id, request))) => {
                        self.edit_error = None;
                        self.busy.insert(id);
                        Cmd::new(async move {
                            match api::update_task(&session, id, request).await {
                                Ok(task) => Msg::TaskSaved(task),
                                Err(e) => failed("Saving task", Some(id), e),
                            }
                        })
                    }
                }
            }
            Msg::CompleteTask(id) => {
                let Some(session) = self.session.clone() else {
                    return Cmd::new(async { Msg::FetchTasks });
                };
                self.busy.insert(id);
                Cmd::new(async move {
                    match api::update_task(&session, id, UpdateTaskRequest::finish()).await {
                        Ok(task) => Msg::TaskSaved(task),
                        Err(e) => failed("Completing task", Some(id), e),
                    }
                })
            }
            Msg::TaskSaved(task) => {
                self.busy.remove(&task.id);
                self.board.apply_saved(task);
                Cmd::none()
            }
            Msg::DeleteTask(id) => {
                let Some(session) = self.session.clone() else {
                    return Cmd::new(async { Msg::FetchTasks });
                };
                if !confirm("Are you sure you want to delete this task?") {
                    return Cmd::none();
                }
                self.busy.insert(id);
                Cmd::new(async move {
                    match api::delete_task(&session, id).await {
                        Ok(()) => Msg::TaskDeleted(id),
                        Err(e) => failed("Deleting task", Some(id), e),
                    }
                })
            }
            Msg::TaskDeleted(id) => {
                self.busy.remove(&id);
                self.board.remove(id);
                Cmd::none()
            }

            Msg::RequestFailed {
                context,
                task,
                error,
            } => {
                error.log(context);
                self.loading = false;
                if let Some(id) = task {
                    self.busy.remove(&id);
                    if self.board.save_failed(id) {
                        self.edit_error = Some(format!("Could not save the task: {error}"));
                    }
                }
                if error.is_unauthorized() {
                    // Token expired or revoked server-side.
                    Cmd::new(async { Msg::Logout })
                } else {
                    Cmd::none()
                }
            }
        }
    }

    fn view(&self) -> Node<Msg> {
        div(
            [class("min-h-screen")],
            [match self.page {
                Page::Login => self.view_login(),
                Page::Tasks => self.view_tasks_page(),
            }],
        )
    }
}

impl Model {
    fn view_login(&self) -> Node<Msg> {
        section(
            [class("login")],
            [
                h1([class("title")], [text("Login")]),
                p([class("field")], [text("Email")]),
                input(
                    [
                        r#type("text"),
                        value(&self.login.email),
                        on_input(|event| Msg::SetEmail(event.value())),
                    ],
                    [],
                ),
                p([class("field")], [text("Password")]),
                div(
                    [class("password")],
                    [
                        input(
                            [
                                r#type(if self.login.password_visible {
                                    "text"
                                } else {
                                    "password"
                                }),
                                value(&self.login.password),
                                on_input(|event| Msg::SetPassword(event.value())),
                            ],
                            [],
                        ),
                        button(
                            [
                                r#type("button"),
                                on_click(|_| Msg::TogglePasswordVisibility),
                            ],
                            [text(if self.login.password_visible { "Hide" } else { "Show" })],
                        ),
                    ],
                ),
                button(
                    [
                        on_click(|_| Msg::SubmitLogin),
                        disabled(self.login.loading),
                    ],
                    [text(if self.login.loading { "Loading..." } else { "Sign in" })],
                ),
                match &self.login.error {
                    Some(error) => p([class("error")], [text(error)]),
                    None => span([], []),
                },
            ],
        )
    }

    fn view_tasks_page(&self) -> Node<Msg> {
        let (pending, done) = self.board.counts();
        section(
            [class("tasks")],
            [
                div(
                    [class("menu")],
                    [
                        self.view_create_form(),
                        self.view_filters(),
                        button([on_click(|_| Msg::Logout)], [text("Sign out")]),
                    ],
                ),
                div(
                    [class("content")],
                    [
                        input(
                            [
                                r#type("search"),
                                placeholder("Search tasks"),
                                value(self.board.search().to_string()),
                                on_input(|event| Msg::SetSearch(event.value())),
                            ],
                            [],
                        ),
                        p(
                            [class("counts")],
                            [text(format!("{pending} pending, {done} completed"))],
                        ),
                        if self.loading {
                            div([class("loading")], [text("Loading...")])
                        } else {
                            self.view_task_list()
                        },
                    ],
                ),
            ],
        )
    }

    fn view_create_form(&self) -> Node<Msg> {
        div(
            [class("create")],
            [
                h2([], [text("New task")]),
                input(
                    [
                        r#type("text"),
                        placeholder("Title"),
                        value(&self.new_task.title),
                        on_input(|event| Msg::SetNewTitle(event.value())),
                    ],
                    [],
                ),
                textarea(
                    [
                        placeholder("Description"),
                        value(&self.new_task.description),
                        on_input(|event| Msg::SetNewDescription(event.value())),
                    ],
                    [],
                ),
                input(
                    [
                        r#type("date"),
                        value(&self.new_task.due_date),
                        on_input(|event| Msg::SetNewDueDate(event.value())),
                    ],
                    [],
                ),
                button([on_click(|_| Msg::CreateTask)], [text("Add task")]),
                match &self.new_task.error {
                    Some(error) => p([class("error")], [text(error)]),
                    None => span([], []),
                },
            ],
        )
    }

    fn view_filters(&self) -> Node<Msg> {
        let current = self.board.filter();
        let sort = self.board.sort();
        div(
            [class("filters")],
            Filter::ALL
                .into_iter()
                .map(|filter| {
                    button(
                        [
                            class(if filter == current { "active" } else { "" }),
                            on_click(move |_| Msg::SetFilter(filter)),
                        ],
                        [text(filter.label())],
                    )
                })
                .chain([
                    button(
                        [
                            class(if sort == Some(SortOrder::Asc) { "active" } else { "" }),
                            on_click(|_| Msg::SetSort(SortOrder::Asc)),
                        ],
                        [text("A-Z")],
                    ),
                    button(
                        [
                            class(if sort == Some(SortOrder::Desc) { "active" } else { "" }),
                            on_click(|_| Msg::SetSort(SortOrder::Desc)),
                        ],
                        [text("Z-A")],
                    ),
                ])
                .collect::<Vec<_>>(),
        )
    }

    fn view_task_list(&self) -> Node<Msg> {
        let visible = self.board.visible();
        if visible.is_empty() {
            return p([class("empty")], [text("No tasks to show.")]);
        }
        div(
            [class("task-list")],
            visible
                .into_iter()
                .map(|task| self.view_task(task))
                .collect::<Vec<_>>(),
        )
    }

    fn view_task(&self, task: &Task) -> Node<Msg> {
        let is_busy = self.busy.contains(&task.id);
        let task_id = task.id;

        let body = match (self.board.row_state(task.id), self.board.draft()) {
            (RowState::Editing, Some(draft)) => div(
                [class("edit")],
                [
                    input(
                        [
                            r#type("text"),
                            value(&draft.title),
                            on_input(|event| Msg::SetEditTitle(event.value())),
                        ],
                        [],
                    ),
                    textarea(
                        [
                            value(&draft.description),
                            on_input(|event| Msg::SetEditDescription(event.value())),
                        ],
                        [],
                    ),
                    match &self.edit_error {
                        Some(error) => p([class("error")], [text(error)]),
                        None => span([], []),
                    },
                    button([on_click(|_| Msg::SaveEdit)], [text("Save")]),
                    button([on_click(|_| Msg::CancelEdit)], [text("Cancel")]),
                ],
            ),
            (RowState::Saving, Some(draft)) => div(
                [class("view saving")],
                [
                    h2([], [text(&draft.title)]),
                    p([], [text(&draft.description)]),
                    p([class("pending")], [text("Saving...")]),
                ],
            ),
            _ => div(
                [class("view")],
                [
                    h2([], [text(&task.title)]),
                    p([], [text(&task.description)]),
                    match task.due_date {
                        Some(date) => p([class("due")], [text(format!("Due {date}"))]),
                        None => span([], []),
                    },
                ],
            ),
        };

        div(
            [
                key(task.id.to_string()),
                class(if task.finished { "task completed" } else { "task" }),
            ],
            [
                body,
                div(
                    [class("actions")],
                    [
                        button(
                            [
                                r#type("button"),
                                disabled(is_busy),
                                on_click(move |_| Msg::EditTask(task_id)),
                            ],
                            [text("Edit")],
                        ),
                        if task.finished {
                            span([class("done")], [text("Done")])
                        } else {
                            button(
                                [
                                    r#type("button"),
                                    disabled(is_busy),
                                    on_click(move |_| Msg::CompleteTask(task_id)),
                                ],
                                [text("Complete")],
                            )
                        },
                        button(
                            [
                                r#type("button"),
                                disabled(is_busy),
                                on_click(move |_| Msg::DeleteTask(task_id)),
                            ],
                            [text("Delete")],
                        ),
                    ],
                ),
            ],
        )
    }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    Program::mount_to_body(Model::default());
}
