use chrono::NaiveDate;
use shared::{CreateTaskRequest, Credentials};

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub password_visible: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl LoginForm {
    /// Validates the fields and, if they pass, marks the form as loading.
    pub fn submit(&mut self) -> Option<Credentials> {
        if self.loading {
            return None;
        }
        let credentials = Credentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        match credentials.validate_login() {
            Ok(()) => {
                self.error = None;
                self.loading = true;
                Some(credentials)
            }
            Err(errors) => {
                self.error = Some(errors.to_string());
                None
            }
        }
    }

    pub fn failed(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    /// Clears everything except the email.
    pub fn succeeded(&mut self) {
        self.password.clear();
        self.loading = false;
        self.error = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskForm {
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD` as produced by a date input, or empty.
    pub due_date: String,
    pub error: Option<String>,
}

impl NewTaskForm {
    /// Builds a create request and resets the form, or records why it can't.
    pub fn submit(&mut self) -> Option<CreateTaskRequest> {
        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    self.error = Some("Due date must be a valid date.".to_string());
                    return None;
                }
            },
        };
        let request = CreateTaskRequest {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date,
            finished: None,
        };
        if let Err(errors) = request.validate() {
            self.error = Some(errors.to_string());
            return None;
        }
        *self = Self::default();
        Some(request)
    }
}
