use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
    time::{Duration, Instant},
};

use tracing::{debug, error, info};

use crate::{
    api::TaskApi,
    auth::AuthProvider,
    config::ClientConfig,
    error::ClientError,
    model::{Task, TaskId},
    schema::{CreateTaskSchema, LoginSchema, RegisterSchema, UpdateTaskSchema},
    view::{render_task_list, Alert, AlertBoard, Navigation, Page, TaskItem},
};

pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
pub const LOGIN_ERROR: &str = "An error occurred during login. Please try again.";
pub const REGISTER_OK: &str = "Registration successful. Please login.";
pub const REGISTER_FAILED: &str = "Registration failed. Please try again.";
pub const REGISTER_ERROR: &str = "An error occurred during registration. Please try again.";
pub const LOAD_FAILED: &str = "Failed to load tasks. Please try again.";
pub const ADD_OK: &str = "Task added successfully.";
pub const ADD_FAILED: &str = "Failed to add task. Please try again.";
pub const UPDATE_OK: &str = "Task updated successfully.";
pub const UPDATE_FAILED: &str = "Failed to update task. Please try again.";
pub const DELETE_OK: &str = "Task deleted successfully.";
pub const DELETE_FAILED: &str = "Failed to delete task. Please try again.";
pub const LOGOUT_FAILED: &str = "Failed to log out. Please try again.";

/// A user action on the page.
#[derive(Debug, Clone)]
pub enum Command {
    Load(Page),
    Login(LoginSchema),
    Register(RegisterSchema),
    AddTask { content: String },
    ToggleCompletion { id: TaskId, completed: bool },
    EditTask { id: TaskId, content: String },
    DeleteTask { id: TaskId },
    Logout,
    Refresh,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load(_) => "load",
            Command::Login(_) => "login",
            Command::Register(_) => "register",
            Command::AddTask { .. } => "add_task",
            Command::ToggleCompletion { .. } => "toggle_completion",
            Command::EditTask { .. } => "edit_task",
            Command::DeleteTask { .. } => "delete_task",
            Command::Logout => "logout",
            Command::Refresh => "refresh",
        }
    }
}

/// What a successful command changed on the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub alerts: Vec<Alert>,
    pub navigation: Option<Navigation>,
    /// The displayed list was replaced by a fresh server read.
    pub rendered: bool,
}

#[derive(Debug)]
struct PageState {
    tasks: Vec<Task>,
    items: Vec<TaskItem>,
    alerts: AlertBoard,
    applied_ticket: u64,
}

/// Session context for one page: the API, the auth provider and what is on screen.
///
/// Handlers take `&self` and may run concurrently. Every list read takes a
/// ticket and only the newest completed read is ever displayed.
#[derive(Debug)]
pub struct PageController<A> {
    api: TaskApi,
    auth: A,
    redirect_delay: Duration,
    state: Mutex<PageState>,
    tickets: AtomicU64,
}

impl<A: AuthProvider> PageController<A> {
    pub fn new(api: TaskApi, auth: A, config: &ClientConfig) -> Self {
        Self {
            api,
            auth,
            redirect_delay: config.redirect_delay,
            state: Mutex::new(PageState {
                tasks: Vec::new(),
                items: Vec::new(),
                alerts: AlertBoard::new(config.alert_ttl),
                applied_ticket: 0,
            }),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn api(&self) -> &TaskApi {
        &self.api
    }

    /// The currently rendered list items.
    pub fn rendered(&self) -> Vec<TaskItem> {
        self.lock().items.clone()
    }

    /// The tasks behind the rendered list, as last read from the server.
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn visible_alerts(&self) -> Vec<Alert> {
        self.visible_alerts_at(Instant::now())
    }

    pub fn visible_alerts_at(&self, now: Instant) -> Vec<Alert> {
        self.lock().alerts.visible(now)
    }

    pub async fn dispatch(&self, command: Command) -> Result<Effects, ClientError> {
        debug!(command = command.name(), "dispatching");
        match command {
            Command::Load(page) => self.load(page).await,
            Command::Login(form) => self.login(form).await,
            Command::Register(form) => self.register(form).await,
            Command::AddTask { content } => self.add_task(content).await,
            Command::ToggleCompletion { id, completed } => {
                self.toggle_completion(id, completed).await
            }
            Command::EditTask { id, content } => self.edit_task(id, content).await,
            Command::DeleteTask { id } => self.delete_task(id).await,
            Command::Logout => self.logout(),
            Command::Refresh => self.refresh().await,
        }
    }

    // Handler for page load: only the home page fetches tasks
    pub async fn load(&self, page: Page) -> Result<Effects, ClientError> {
        if page.shows_task_list() {
            self.refresh().await
        } else {
            Ok(Effects::default())
        }
    }

    // Handler for the login form
    pub async fn login(&self, form: LoginSchema) -> Result<Effects, ClientError> {
        let credential = self.auth.candidate(&form.email, &form.password);

        if let Err(e) = self.api.check_credential(&credential).await {
            return Err(match e {
                ClientError::Status { .. } => self.fail(LOGIN_FAILED, e, "Login rejected"),
                _ => self.fail(LOGIN_ERROR, e, "Login error"),
            });
        }
        if let Err(e) = self.auth.sign_in(&credential) {
            return Err(self.fail(LOGIN_ERROR, e, "Login error"));
        }

        info!(email = %form.email, "logged in");
        Ok(Effects {
            navigation: Some(Navigation::now(Page::Home)),
            ..Effects::default()
        })
    }

    // Handler for the registration form
    pub async fn register(&self, form: RegisterSchema) -> Result<Effects, ClientError> {
        match self.api.register(&form).await {
            Ok(response) => {
                info!(email = %form.email, message = ?response.message, "registered");
                Ok(Effects {
                    alerts: vec![self.show(Alert::success(REGISTER_OK))],
                    navigation: Some(Navigation::after(Page::Login, self.redirect_delay)),
                    rendered: false,
                })
            }
            Err(e) => {
                let message = match &e {
                    ClientError::Status { detail, .. } => detail
                        .clone()
                        .unwrap_or_else(|| REGISTER_FAILED.to_string()),
                    _ => REGISTER_ERROR.to_string(),
                };
                Err(self.fail(&message, e, "Registration error"))
            }
        }
    }

    /// Takes the new-task input, leaving it empty whatever the outcome.
    pub async fn submit_new_task(&self, input: &mut String) -> Result<Effects, ClientError> {
        let content = std::mem::take(input);
        self.add_task(content).await
    }

    // Handler for creating a new Task
    pub async fn add_task(&self, content: String) -> Result<Effects, ClientError> {
        let body = CreateTaskSchema { content };
        self.mutate_then_reload(
            async {
                let auth = self.auth.auth_headers()?;
                self.api.create_task(auth, &body).await
            },
            ADD_OK,
            ADD_FAILED,
            "Error adding task",
        )
        .await
    }

    // Handler for the completion checkbox
    pub async fn toggle_completion(
        &self,
        id: TaskId,
        completed: bool,
    ) -> Result<Effects, ClientError> {
        self.update_task(id, UpdateTaskSchema::completed(completed)).await
    }

    pub async fn edit_task(&self, id: TaskId, content: String) -> Result<Effects, ClientError> {
        self.update_task(id, UpdateTaskSchema::content(content)).await
    }

    // Handler for updating a Task by ID
    pub async fn update_task(
        &self,
        id: TaskId,
        update: UpdateTaskSchema,
    ) -> Result<Effects, ClientError> {
        self.mutate_then_reload(
            async {
                let auth = self.auth.auth_headers()?;
                self.api.update_task(auth, id, &update).await
            },
            UPDATE_OK,
            UPDATE_FAILED,
            "Error updating task",
        )
        .await
    }

    // Handler for deleting a Task by ID
    pub async fn delete_task(&self, id: TaskId) -> Result<Effects, ClientError> {
        self.mutate_then_reload(
            async {
                let auth = self.auth.auth_headers()?;
                self.api.delete_task(auth, id).await
            },
            DELETE_OK,
            DELETE_FAILED,
            "Error deleting task",
        )
        .await
    }

    // Handler for logout; no server call
    pub fn logout(&self) -> Result<Effects, ClientError> {
        if let Err(e) = self.auth.sign_out() {
            return Err(self.fail(LOGOUT_FAILED, e, "Logout error"));
        }
        {
            // Reads issued before logout belong to the old session.
            let mut state = self.lock();
            state.applied_ticket = self.tickets.load(Ordering::SeqCst);
            state.tasks.clear();
            state.items.clear();
        }
        info!("logged out");
        Ok(Effects {
            navigation: Some(Navigation::now(Page::Login)),
            ..Effects::default()
        })
    }

    // Handler for fetching and rendering the task list
    pub async fn refresh(&self) -> Result<Effects, ClientError> {
        match self.reload().await {
            Ok(rendered) => Ok(Effects {
                rendered,
                ..Effects::default()
            }),
            Err(e) => Err(self.fail(LOAD_FAILED, e, "Error fetching tasks")),
        }
    }

    async fn mutate_then_reload<T>(
        &self,
        request: impl Future<Output = Result<T, ClientError>>,
        success: &str,
        failure: &str,
        context: &str,
    ) -> Result<Effects, ClientError> {
        if let Err(e) = request.await {
            return Err(self.fail(failure, e, context));
        }

        let mut effects = Effects {
            alerts: vec![self.show(Alert::success(success))],
            ..Effects::default()
        };
        match self.reload().await {
            Ok(rendered) => effects.rendered = rendered,
            Err(e) => {
                error!(error = %e, "Error fetching tasks");
                effects.alerts.push(self.show(Alert::error(LOAD_FAILED)));
            }
        }
        Ok(effects)
    }

    async fn reload(&self) -> Result<bool, ClientError> {
        let ticket = self.next_ticket();
        let auth = self.auth.auth_headers()?;
        let tasks = self.api.list_tasks(auth).await?;
        Ok(self.apply(ticket, tasks))
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn apply(&self, ticket: u64, tasks: Vec<Task>) -> bool {
        let mut state = self.lock();
        if ticket <= state.applied_ticket {
            debug!(ticket, applied = state.applied_ticket, "discarding stale task list");
            return false;
        }
        state.applied_ticket = ticket;
        state.items = render_task_list(&tasks);
        state.tasks = tasks;
        true
    }

    fn show(&self, alert: Alert) -> Alert {
        self.lock().alerts.show(alert.clone(), Instant::now());
        alert
    }

    fn fail(&self, message: &str, e: ClientError, context: &str) -> ClientError {
        error!(error = %e, "{context}");
        self.show(Alert::error(message));
        e
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
