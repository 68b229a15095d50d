use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::models::Gender;
use crate::validation::{
    Checker, MAX_NAME_CHARS, NewComment, NewProfile, Page, ProfileChanges, ProfileFilter,
    ValidationError, validate_age, validate_text,
};

/// One JSON body field: absent, explicitly `null`, a value, or something
/// that would not parse as `T`.
///
/// Use with `#[serde(default)]` so a missing key becomes [`Field::Missing`].
/// A value of the wrong shape is kept as [`Field::Invalid`] instead of failing
/// the whole body, so `validate` can report it next to every other bad field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    #[default]
    Missing,
    Null,
    Value(T),
    Invalid(String),
}

impl<'de, T> Deserialize<'de> for Field<T>
where
    T: DeserializeOwned,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Field::Null);
        }
        Ok(match serde_json::from_value(raw) {
            Ok(value) => Field::Value(value),
            Err(err) => Field::Invalid(err.to_string()),
        })
    }
}

impl<T> Field<T> {
    /// Must be present and non-null.
    fn required(self, checker: &mut Checker, field: &'static str) -> Option<T> {
        match self {
            Field::Missing => {
                checker.push(field, "field is required");
                None
            }
            other => other.present(checker, field),
        }
    }

    /// May be absent; `null` is rejected.
    fn present(self, checker: &mut Checker, field: &'static str) -> Option<T> {
        match self {
            Field::Missing => None,
            Field::Null => {
                checker.push(field, "must not be null");
                None
            }
            Field::Value(value) => Some(value),
            Field::Invalid(message) => {
                checker.push(field, message);
                None
            }
        }
    }

    /// May be absent or `null`. `Some(None)` means "clear".
    fn nullable(self, checker: &mut Checker, field: &'static str) -> Option<Option<T>> {
        match self {
            Field::Missing => None,
            Field::Null => Some(None),
            Field::Value(value) => Some(Some(value)),
            Field::Invalid(message) => {
                checker.push(field, message);
                None
            }
        }
    }
}

fn checked_name(
    checker: &mut Checker,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    if let Some(name) = &value {
        checker.check(field, validate_text(name, Some(MAX_NAME_CHARS)));
    }
    value
}

fn checked_age(checker: &mut Checker, field: &'static str, value: Option<i64>) -> Option<i64> {
    if let Some(age) = value {
        checker.check(field, validate_age(age));
    }
    value
}

fn checked_text(
    checker: &mut Checker,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    if let Some(text) = &value {
        checker.check(field, validate_text(text, None));
    }
    value
}

// -- Profiles --

/// Body of `POST /profiles`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub name: Field<String>,
    #[serde(default)]
    pub age: Field<i64>,
    #[serde(default)]
    pub gender: Field<Gender>,
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub interests: Field<String>,
    #[serde(default)]
    pub contact: Field<String>,
}

impl CreateProfileRequest {
    pub fn validate(self) -> Result<NewProfile, ValidationError> {
        let mut checker = Checker::new();

        let name = self.name.required(&mut checker, "name");
        let name = checked_name(&mut checker, "name", name);
        let age = self.age.required(&mut checker, "age");
        let age = checked_age(&mut checker, "age", age);
        let gender = self.gender.required(&mut checker, "gender");
        let description = self.description.nullable(&mut checker, "description");
        let interests = self.interests.nullable(&mut checker, "interests");
        let contact = self.contact.required(&mut checker, "contact");
        let contact = checked_text(&mut checker, "contact", contact);

        let (Some(name), Some(age), Some(gender), Some(contact)) = (name, age, gender, contact)
        else {
            return Err(checker.into_error());
        };

        checker.finish(NewProfile {
            name,
            age,
            gender,
            description: description.flatten(),
            interests: interests.flatten(),
            contact,
        })
    }
}

/// Body of `PUT /profiles/{id}`. Unknown keys are ignored, so a profile
/// fetched with `GET` can be edited and sent back as is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Field<String>,
    #[serde(default)]
    pub age: Field<i64>,
    #[serde(default)]
    pub gender: Field<Gender>,
    #[serde(default)]
    pub description: Field<String>,
    #[serde(default)]
    pub interests: Field<String>,
    #[serde(default)]
    pub contact: Field<String>,
}

impl UpdateProfileRequest {
    /// Only supplied fields are checked. `null` is accepted for the optional
    /// text fields and rejected for the required ones.
    pub fn validate(self) -> Result<ProfileChanges, ValidationError> {
        let mut checker = Checker::new();

        let name = self.name.present(&mut checker, "name");
        let name = checked_name(&mut checker, "name", name);
        let age = self.age.present(&mut checker, "age");
        let age = checked_age(&mut checker, "age", age);
        let gender = self.gender.present(&mut checker, "gender");
        let description = self.description.nullable(&mut checker, "description");
        let interests = self.interests.nullable(&mut checker, "interests");
        let contact = self.contact.present(&mut checker, "contact");
        let contact = checked_text(&mut checker, "contact", contact);

        checker.finish(ProfileChanges {
            name,
            age,
            gender,
            description,
            interests,
            contact,
        })
    }
}

/// Query string for `GET /profiles`. Values stay raw until `validate` so a
/// bad one is reported per field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub gender: Option<String>,
}

impl ProfileListQuery {
    pub fn validate(self) -> Result<(ProfileFilter, Page), ValidationError> {
        let mut checker = Checker::new();

        let min_age = parse_int(&mut checker, "min_age", self.min_age);
        let min_age = checked_age(&mut checker, "min_age", min_age);
        let max_age = parse_int(&mut checker, "max_age", self.max_age);
        let max_age = checked_age(&mut checker, "max_age", max_age);

        let gender = match self.gender.map(|raw| raw.parse::<Gender>()) {
            Some(Ok(gender)) => Some(gender),
            Some(Err(err)) => {
                checker.push("gender", err.to_string());
                None
            }
            None => None,
        };

        let page = page_window(&mut checker, self.page, self.limit);

        let filter = ProfileFilter {
            min_age,
            max_age,
            gender,
        };
        checker.finish((filter, page))
    }
}

// -- Comments --

/// Body of `POST /profiles/{id}/comments`. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub author_name: Field<String>,
    #[serde(default)]
    pub content: Field<String>,
}

impl CreateCommentRequest {
    pub fn validate(self) -> Result<NewComment, ValidationError> {
        let mut checker = Checker::new();

        let author_name = self.author_name.required(&mut checker, "author_name");
        let author_name = checked_name(&mut checker, "author_name", author_name);
        let content = self.content.required(&mut checker, "content");
        let content = checked_text(&mut checker, "content", content);

        let (Some(author_name), Some(content)) = (author_name, content) else {
            return Err(checker.into_error());
        };

        checker.finish(NewComment {
            author_name,
            content,
        })
    }
}

/// Query string for paginated comment listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn validate(self) -> Result<Page, ValidationError> {
        let mut checker = Checker::new();
        let page = page_window(&mut checker, self.page, self.limit);
        checker.finish(page)
    }
}

fn parse_int(checker: &mut Checker, field: &'static str, raw: Option<String>) -> Option<i64> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            checker.push(field, format!("must be an integer, got '{raw}'"));
            None
        }
    }
}

/// Unparsable values fall back to the defaults; their errors are already recorded.
fn page_window(checker: &mut Checker, page: Option<String>, limit: Option<String>) -> Page {
    let defaults = Page::default();
    let page = parse_int(checker, "page", page).unwrap_or(defaults.page());
    let limit = parse_int(checker, "limit", limit).unwrap_or(defaults.limit());
    match Page::new(page, limit) {
        Ok(window) => window,
        Err(err) => {
            checker.absorb(err);
            defaults
        }
    }
}
