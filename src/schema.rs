use reqwest::multipart::Form;
use serde::{Deserialize, Serialize};

/// A form body sent as `multipart/form-data`.
pub trait FormBody {
    /// Field name/value pairs, in submission order.
    fn fields(&self) -> Vec<(&'static str, String)>;

    fn to_form(&self) -> Form {
        self.fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
    }
}

// Struct representing the login form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSchema {
    pub email: String,
    pub password: String,
}

// Struct representing the registration form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSchema {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl FormBody for RegisterSchema {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.clone()),
            ("password", self.password.clone()),
            ("first_name", self.first_name.clone()),
            ("last_name", self.last_name.clone()),
        ]
    }
}

// Struct representing the request body for creating a new Task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskSchema {
    pub content: String,
}

impl FormBody for CreateTaskSchema {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![("content", self.content.clone())]
    }
}

// Struct representing a partial Task update; unset fields are not sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskSchema {
    pub content: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTaskSchema {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.completed.is_none()
    }
}

impl FormBody for UpdateTaskSchema {
    fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(content) = &self.content {
            fields.push(("content", content.clone()));
        }
        if let Some(completed) = self.completed {
            fields.push(("completed", completed.to_string()));
        }
        fields
    }
}
