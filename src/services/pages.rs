use crate::api::ApiClient;
use crate::domain::editor::{PageEditor, SaveStep};
use crate::domain::models::{BlockPayload, ContentBlock, NewMenuItem, Page, PagePayload};
use crate::error::{ClientError, ClientResult};
use serde::Serialize;
use std::future::Future;

const PREVIEW_CHARS: usize = 120;

/// Records committed steps so a failure can report exactly how far a save
/// got. Reads are never recorded.
#[derive(Default)]
struct StepLog {
    completed: Vec<SaveStep>,
}

impl StepLog {
    /// Runs a mutating call and records it once it succeeds.
    async fn run<T, F>(&mut self, step: SaveStep, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        match call.await {
            Ok(value) => {
                tracing::debug!("Save step done: {}", step);
                self.completed.push(step);
                Ok(value)
            }
            Err(source) => Err(self.failed(step, source)),
        }
    }

    /// Runs a read-only call; it can fail a save but never commits anything.
    async fn read<T, F>(&mut self, step: SaveStep, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        call.await.map_err(|source| self.failed(step, source))
    }

    fn failed(&mut self, step: SaveStep, source: ClientError) -> ClientError {
        // Nothing committed yet: client and server still agree.
        if self.completed.is_empty() {
            return source;
        }
        tracing::error!(
            "Save step `{}` failed after {} committed step(s): {}",
            step,
            self.completed.len(),
            source
        );
        ClientError::PartialSave {
            completed: std::mem::take(&mut self.completed),
            failed: step,
            source: Box::new(source),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReport {
    pub page_id: i64,
    pub slug: String,
    pub steps: Vec<SaveStep>,
}

/// Saves an existing page: page fields first, then block deletions, then
/// block creations and updates in list order. Calls are issued one at a
/// time and the first failure stops the sequence.
///
/// Every committed step is folded back into `editor`, so calling this again
/// after a [`ClientError::PartialSave`] only performs what is left.
pub async fn save_page(
    api: &ApiClient,
    token: &str,
    editor: &mut PageEditor,
) -> ClientResult<SaveReport> {
    editor.validate()?;
    let (page_id, original_slug) = match (editor.page_id(), editor.original_slug()) {
        (Some(id), Some(slug)) => (id, slug.to_string()),
        _ => return Err(ClientError::validation("page", "page has not been created yet")),
    };
    let mut log = StepLog::default();
    let slug = editor.clean_slug();
    let title = editor.title().to_string();

    log.run(
        SaveStep::UpdatePage {
            slug: original_slug.clone(),
        },
        api.update_page(token, &original_slug, &PagePayload { title: &title, slug: &slug }),
    )
    .await?;
    editor.page_saved(page_id, slug.clone());

    sync_blocks(api, token, editor, &mut log).await?;
    tracing::info!("Page `{}` saved ({} step(s))", slug, log.completed.len());
    Ok(SaveReport {
        page_id,
        slug,
        steps: log.completed,
    })
}

/// Creates a new page, its blocks and the public menu entry pointing at it.
/// Safe to call again after a partial failure.
pub async fn publish_new_page(
    api: &ApiClient,
    token: &str,
    editor: &mut PageEditor,
) -> ClientResult<SaveReport> {
    editor.validate()?;
    let mut log = StepLog::default();
    let slug = editor.clean_slug();
    let title = editor.title().to_string();

    let page_id = match editor.page_id() {
        Some(id) => id,
        None => {
            let created = log
                .run(
                    SaveStep::CreatePage,
                    api.create_page(token, &PagePayload { title: &title, slug: &slug }),
                )
                .await?;
            editor.page_saved(created.id, slug.clone());
            created.id
        }
    };

    sync_blocks(api, token, editor, &mut log).await?;

    if !editor.menu_linked() {
        let item = NewMenuItem {
            label: title,
            slug: slug.clone(),
            order: 1,
            page_id,
            is_public: true,
            required_role: None,
        };
        log.run(
            SaveStep::CreateMenuItem { slug: slug.clone() },
            api.create_menu_item(token, &item),
        )
        .await?;
        editor.set_menu_linked();
    }

    tracing::info!("Page `{}` published ({} step(s))", slug, log.completed.len());
    Ok(SaveReport {
        page_id,
        slug,
        steps: log.completed,
    })
}

async fn sync_blocks(
    api: &ApiClient,
    token: &str,
    editor: &mut PageEditor,
    log: &mut StepLog,
) -> ClientResult<()> {
    let page_id = editor
        .page_id()
        .ok_or_else(|| ClientError::validation("page", "page has not been created yet"))?;
    let slug = editor.clean_slug();

    let server = log
        .read(
            SaveStep::RefreshSnapshot { slug: slug.clone() },
            api.get_page(token, &slug),
        )
        .await?;
    editor.set_snapshot(&server);

    let plan = editor.plan();
    if plan.is_empty() {
        tracing::debug!("Blocks of `{}` already match the server", slug);
    }
    for id in plan.deletes {
        log.run(SaveStep::DeleteBlock { id }, delete_block(api, token, id))
            .await?;
        editor.block_deleted(id);
    }

    for index in 0..editor.blocks().len() {
        let block = editor.blocks()[index].clone();
        let payload = BlockPayload::new(&block, page_id);
        match block.id {
            Some(id) => {
                log.run(SaveStep::UpdateBlock { id }, api.update_block(token, id, &payload))
                    .await?;
            }
            None => {
                let created = log
                    .run(
                        SaveStep::CreateBlock { order: block.order },
                        api.create_block(token, &payload),
                    )
                    .await?;
                editor.block_created(index, created.id);
            }
        }
    }
    Ok(())
}

/// A block that is already gone counts as deleted.
async fn delete_block(api: &ApiClient, token: &str, id: i64) -> ClientResult<()> {
    match api.delete_block(token, id).await {
        Err(ClientError::Server { status: 404, .. }) => {
            tracing::debug!("Block {} already deleted", id);
            Ok(())
        }
        other => other,
    }
}

pub async fn load_editor(api: &ApiClient, token: &str, slug: &str) -> ClientResult<PageEditor> {
    let page = api.get_page(token, slug).await?;
    Ok(PageEditor::from_page(page))
}

#[derive(Debug, Serialize)]
pub struct BlockPreview {
    pub order: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub blocks: Vec<BlockPreview>,
}

pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_CHARS {
        let cut: String = content.chars().take(PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

pub async fn list_pages(api: &ApiClient, token: &str) -> ClientResult<Vec<PageSummary>> {
    let pages = api.list_pages(token).await?;
    Ok(pages
        .into_iter()
        .map(|page| {
            let blocks = page
                .sorted_blocks()
                .into_iter()
                .map(|b| BlockPreview {
                    order: b.order,
                    kind: b.kind.type_tag(),
                    preview: preview(b.kind.content()),
                })
                .collect();
            PageSummary {
                id: page.id,
                title: page.title,
                slug: page.slug,
                blocks,
            }
        })
        .collect())
}

#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: String,
    pub slug: String,
    pub blocks: Vec<ContentBlock>,
}

impl From<Page> for PageView {
    fn from(mut page: Page) -> Self {
        page.content.sort_by_key(|b| b.order);
        Self {
            title: page.title,
            slug: page.slug,
            blocks: page.content,
        }
    }
}

/// Published page for reading. Anonymous readers go through the public
/// endpoint.
pub async fn view_page(api: &ApiClient, token: Option<&str>, slug: &str) -> ClientResult<PageView> {
    let page = match token {
        Some(token) => api.get_page(token, slug).await?,
        None => api.public_page(slug).await?,
    };
    Ok(page.into())
}
