use crate::api::Api;
use crate::cli::globals::GlobalArgs;
use crate::content::{ContentList, SortOrder};
use crate::errors::AppError;
use crate::session::Realm;
use anyhow::{bail, Result};
use std::sync::Arc;

/// Filters for the content list action.
#[derive(Debug)]
pub struct ListArgs {
    pub type_filter: String,
    pub platform: String,
    pub sort: String,
    pub order: SortOrder,
    pub page: u64,
    pub limit: u64,
}

fn admin_list(globals: &GlobalArgs) -> Result<ContentList> {
    let guard = Arc::new(super::guard(globals)?);

    if guard
        .require_or_redirect(Realm::Admin, || {
            eprintln!("not signed in as admin; run `cinenest login` first");
        })
        .is_none()
    {
        bail!("admin session required");
    }

    Ok(ContentList::new(Api::new(&globals.api_url)?, guard))
}

/// Handle the content list action
pub async fn list(globals: &GlobalArgs, args: ListArgs) -> Result<()> {
    let list = admin_list(globals)?;

    list.set_filter("type_filter", args.type_filter);
    list.set_filter("platform_filter", args.platform);
    list.set_sort(args.sort, args.order);
    list.set_page_size(args.limit);

    let mut items = refresh(&list).await?;

    // Page bounds are only known after the first fetch; jump once they are.
    if args.page > 1 {
        list.set_page(args.page);
        if list.state().page() == args.page {
            items = refresh(&list).await?;
        }
    }

    for item in &items {
        let fields = serde_json::to_string(&item.fields)?;
        println!("{}  {}", item.id, fields);
    }

    let state = list.state();
    println!(
        "page {} of {} ({} items total)",
        state.page(),
        state.page_count().max(1),
        state.total()
    );

    Ok(())
}

/// Handle the content delete action
pub async fn delete(globals: &GlobalArgs, id: &str) -> Result<()> {
    let list = admin_list(globals)?;

    match list.remove_item(id).await {
        Ok(()) => {
            println!("deleted {id}");
            Ok(())
        }
        Err(AppError::Unauthorized) => bail!("session expired; run `cinenest login` again"),
        Err(err) => Err(err.into()),
    }
}

async fn refresh(list: &ContentList) -> Result<Vec<crate::content::ContentItem>> {
    match list.refresh().await {
        Ok(items) => Ok(items),
        Err(AppError::Unauthorized) => bail!("session expired; run `cinenest login` again"),
        Err(err) => Err(err.into()),
    }
}
