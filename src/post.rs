//! Post aggregate: a document plus title, slug, taxonomy, SEO and status.
//! This is the unit exchanged with the remote API.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::util::{slugify, split_csv};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
  #[default]
  Draft,
  Published,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seo {
  pub meta_title: String,
  pub meta_description: String,
  pub keywords: Vec<String>,
  pub og_title: String,
  pub og_description: String,
  pub og_image: String,
  pub canonical_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
  pub title: String,
  pub slug: String,
  pub excerpt: String,
  pub thumbnail: String,
  pub category: String,
  pub tags: Vec<String>,
  pub author: String,
  pub status: PostStatus,
  pub content: Document,
  pub seo: Seo,
}

impl Post {
  /// Fill derived fields before sending. A blank slug is derived from the title.
  pub fn prepared_for_save(&self) -> Post {
    let mut out = self.clone();
    if out.slug.trim().is_empty() {
      out.slug = slugify(&out.title);
    }
    out
  }
}

/// Post fetched from the remote API, with its server-assigned id.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StoredPost {
  #[serde(default, alias = "_id", deserialize_with = "crate::api::id_from_value")]
  pub id: String,
  #[serde(flatten)]
  pub post: Post,
}

/// Metadata as typed into the console form. Every field is optional so the
/// form can patch one value at a time; `tags` and `keywords` are
/// comma-separated strings.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostMeta {
  pub title: Option<String>,
  pub slug: Option<String>,
  pub excerpt: Option<String>,
  pub thumbnail: Option<String>,
  pub category: Option<String>,
  pub tags: Option<String>,
  pub author: Option<String>,
  pub status: Option<PostStatus>,
  pub meta_title: Option<String>,
  pub meta_description: Option<String>,
  pub keywords: Option<String>,
  pub og_title: Option<String>,
  pub og_description: Option<String>,
  pub og_image: Option<String>,
  pub canonical_url: Option<String>,
}

impl PostMeta {
  /// New post with the given fields applied. The document is untouched.
  pub fn apply_to(&self, post: &Post) -> Post {
    fn set(target: &mut String, value: &Option<String>) {
      if let Some(v) = value {
        *target = v.clone();
      }
    }

    let mut out = post.clone();
    set(&mut out.title, &self.title);
    set(&mut out.slug, &self.slug);
    set(&mut out.excerpt, &self.excerpt);
    set(&mut out.thumbnail, &self.thumbnail);
    set(&mut out.category, &self.category);
    set(&mut out.author, &self.author);
    if let Some(tags) = &self.tags {
      out.tags = split_csv(tags);
    }
    if let Some(status) = self.status {
      out.status = status;
    }

    set(&mut out.seo.meta_title, &self.meta_title);
    set(&mut out.seo.meta_description, &self.meta_description);
    set(&mut out.seo.og_title, &self.og_title);
    set(&mut out.seo.og_description, &self.og_description);
    set(&mut out.seo.og_image, &self.og_image);
    set(&mut out.seo.canonical_url, &self.canonical_url);
    if let Some(keywords) = &self.keywords {
      out.seo.keywords = split_csv(keywords);
    }
    out
  }

  pub fn is_empty(&self) -> bool {
    *self == PostMeta::default()
  }
}
