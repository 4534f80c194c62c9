use bytes::Bytes;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Stored club document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Club {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    pub name: String,
    pub hashtag: Vec<String>,
    pub current_number_of_people: u32,
    pub maximum_number_of_people: u32,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub deadline: DateTime<Utc>,
    pub dues: u32,
    /// Empty when the club has no thumbnail.
    #[serde(default)]
    pub thumbnail_id: String,
    #[serde(default)]
    pub photo_id_list: Vec<String>,
}

impl Club {
    pub fn new(c: NewClub) -> Self {
        Self {
            id: None,
            name: c.name,
            hashtag: c.hashtag,
            current_number_of_people: c.current_number_of_people,
            maximum_number_of_people: c.maximum_number_of_people,
            deadline: c.deadline,
            dues: c.dues,
            thumbnail_id: String::new(),
            photo_id_list: Vec::new(),
        }
    }

    #[cfg(test)]
    pub const fn id(&self) -> Option<&ObjectId> {
        self.id.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&str> {
        Some(self.thumbnail_id.as_str()).filter(|t| !t.is_empty())
    }

    pub fn has_photo(&self, photo_id: &str) -> bool {
        self.photo_id_list.iter().any(|p| p == photo_id)
    }

    /// Removes the first entry equal to `photo_id`.
    pub fn remove_photo(&mut self, photo_id: &str) -> bool {
        match self.photo_id_list.iter().position(|p| p == photo_id) {
            Some(pos) => {
                self.photo_id_list.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Client-supplied fields of a club to be registered.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NewClub {
    pub name: String,
    pub hashtag: Vec<String>,
    pub current_number_of_people: u32,
    pub maximum_number_of_people: u32,
    pub deadline: DateTime<Utc>,
    pub dues: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConciseInfo {
    pub name: String,
    pub current_number_of_people: u32,
    pub maximum_number_of_people: u32,
}

impl From<Club> for ConciseInfo {
    fn from(c: Club) -> Self {
        Self {
            name: c.name,
            current_number_of_people: c.current_number_of_people,
            maximum_number_of_people: c.maximum_number_of_people,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetailInfo {
    pub name: String,
    pub hashtag: Vec<String>,
    pub current_number_of_people: u32,
    pub maximum_number_of_people: u32,
    pub deadline: DateTime<Utc>,
    pub dues: u32,
}

impl From<Club> for DetailInfo {
    fn from(c: Club) -> Self {
        Self {
            name: c.name,
            hashtag: c.hashtag,
            current_number_of_people: c.current_number_of_people,
            maximum_number_of_people: c.maximum_number_of_people,
            deadline: c.deadline,
            dues: c.dues,
        }
    }
}

/// A file received through multipart upload.
#[derive(Clone, Debug)]
pub struct Upload {
    pub filename: String,
    pub content: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Response wrapper shared by every JSON endpoint.
#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(body: T) -> Self {
        Self {
            result: true,
            body: Some(body),
            description: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Envelope<()> {
    pub fn done(description: impl Into<String>) -> Self {
        Self {
            result: true,
            body: None,
            description: Some(description.into()),
        }
    }
}
