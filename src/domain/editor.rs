use crate::domain::models::{BlockKind, ContentBlock, Page};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Keeps ASCII letters and digits only.
pub fn sanitize_slug(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// One remote call of a page save, in the order it is issued.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SaveStep {
    CreatePage,
    UpdatePage { slug: String },
    RefreshSnapshot { slug: String },
    DeleteBlock { id: i64 },
    CreateBlock { order: u32 },
    UpdateBlock { id: i64 },
    CreateMenuItem { slug: String },
}

impl fmt::Display for SaveStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStep::CreatePage => write!(f, "create page"),
            SaveStep::UpdatePage { slug } => write!(f, "update page `{slug}`"),
            SaveStep::RefreshSnapshot { slug } => write!(f, "reload page `{slug}`"),
            SaveStep::DeleteBlock { id } => write!(f, "delete block {id}"),
            SaveStep::CreateBlock { order } => write!(f, "create block #{order}"),
            SaveStep::UpdateBlock { id } => write!(f, "update block {id}"),
            SaveStep::CreateMenuItem { slug } => write!(f, "create menu item `{slug}`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEdit {
    /// Switch the block type, keeping its content.
    Kind(String),
    Content(String),
}

/// Remote operations needed to bring the server in line with the editor.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SavePlan {
    pub deletes: Vec<i64>,
    /// Indices into the editor's block list.
    pub creates: Vec<usize>,
    pub updates: Vec<usize>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.creates.is_empty() && self.updates.is_empty()
    }
}

/// In-memory editing state for one page.
///
/// Block positions are only used transiently; the server id is the
/// persisted identity. `order` is always the 1-based position.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEditor {
    page_id: Option<i64>,
    original_slug: Option<String>,
    title: String,
    slug: String,
    blocks: Vec<ContentBlock>,
    #[serde(skip)]
    server_ids: BTreeSet<i64>,
    /// A menu entry points at this page.
    menu_linked: bool,
}

impl Default for PageEditor {
    fn default() -> Self {
        Self::new_page()
    }
}

impl PageEditor {
    pub fn new_page() -> Self {
        Self {
            page_id: None,
            original_slug: None,
            title: String::new(),
            slug: String::new(),
            blocks: Vec::new(),
            server_ids: BTreeSet::new(),
            menu_linked: false,
        }
    }

    pub fn from_page(page: Page) -> Self {
        let mut blocks = page.content;
        blocks.sort_by_key(|b| b.order);
        let server_ids = blocks.iter().filter_map(|b| b.id).collect();
        let mut editor = Self {
            page_id: Some(page.id),
            original_slug: Some(page.slug.clone()),
            title: page.title,
            slug: page.slug,
            blocks,
            server_ids,
            menu_linked: true,
        };
        editor.renumber();
        editor
    }

    pub fn page_id(&self) -> Option<i64> {
        self.page_id
    }

    pub fn original_slug(&self) -> Option<&str> {
        self.original_slug.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn clean_slug(&self) -> String {
        sanitize_slug(&self.slug)
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn menu_linked(&self) -> bool {
        self.menu_linked
    }

    pub fn set_menu_linked(&mut self) {
        self.menu_linked = true;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
    }

    /// Appends an empty text block and returns its index.
    pub fn append(&mut self) -> usize {
        self.push(BlockKind::Text {
            html: String::new(),
        })
    }

    pub fn push(&mut self, kind: BlockKind) -> usize {
        let order = self.blocks.len() as u32 + 1;
        self.blocks.push(ContentBlock {
            id: None,
            kind,
            order,
        });
        self.blocks.len() - 1
    }

    pub fn edit(&mut self, index: usize, edit: BlockEdit) -> ClientResult<()> {
        let block = self
            .blocks
            .get_mut(index)
            .ok_or_else(|| out_of_range(index))?;
        block.kind = match edit {
            BlockEdit::Kind(tag) => block.kind.retag(&tag).ok_or_else(|| {
                ClientError::validation("type", format!("unknown block type `{tag}`"))
            })?,
            BlockEdit::Content(content) => block.kind.with_content(content),
        };
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> ClientResult<ContentBlock> {
        if index >= self.blocks.len() {
            return Err(out_of_range(index));
        }
        let removed = self.blocks.remove(index);
        self.renumber();
        Ok(removed)
    }

    pub fn move_block(&mut self, from: usize, to: usize) -> ClientResult<()> {
        if from >= self.blocks.len() {
            return Err(out_of_range(from));
        }
        if to >= self.blocks.len() {
            return Err(out_of_range(to));
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        self.renumber();
        Ok(())
    }

    /// Replaces the local block list; orders follow the given sequence.
    pub fn replace_blocks(&mut self, blocks: impl IntoIterator<Item = (Option<i64>, BlockKind)>) {
        self.blocks = blocks
            .into_iter()
            .map(|(id, kind)| ContentBlock { id, kind, order: 0 })
            .collect();
        self.renumber();
    }

    pub fn plan(&self) -> SavePlan {
        let local: BTreeSet<i64> = self.blocks.iter().filter_map(|b| b.id).collect();
        let deletes = self
            .server_ids
            .iter()
            .filter(|id| !local.contains(id))
            .copied()
            .collect();
        let mut plan = SavePlan {
            deletes,
            ..SavePlan::default()
        };
        for (index, block) in self.blocks.iter().enumerate() {
            match block.id {
                Some(_) => plan.updates.push(index),
                None => plan.creates.push(index),
            }
        }
        plan
    }

    pub fn page_saved(&mut self, page_id: i64, slug: String) {
        self.page_id = Some(page_id);
        self.slug = slug.clone();
        self.original_slug = Some(slug);
    }

    /// Replaces the last-known server state of the block list.
    pub fn set_snapshot(&mut self, page: &Page) {
        self.server_ids = page.content.iter().filter_map(|b| b.id).collect();
    }

    pub fn block_deleted(&mut self, id: i64) {
        self.server_ids.remove(&id);
    }

    pub fn block_created(&mut self, index: usize, id: i64) {
        if let Some(block) = self.blocks.get_mut(index) {
            block.id = Some(id);
            self.server_ids.insert(id);
        }
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.title.trim().is_empty() {
            return Err(ClientError::validation("title", "title is required"));
        }
        if self.clean_slug().is_empty() {
            return Err(ClientError::validation(
                "slug",
                "slug must contain at least one letter or digit",
            ));
        }
        Ok(())
    }

    fn renumber(&mut self) {
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.order = i as u32 + 1;
        }
    }
}

fn out_of_range(index: usize) -> ClientError {
    ClientError::validation("block", format!("no block at position {index}"))
}
