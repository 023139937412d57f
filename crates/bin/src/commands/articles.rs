//! Article commands: get, list, search.

use byline::{SessionManager, http::types::SearchQuery};

use crate::cli::SearchArgs;

pub async fn get(session: &SessionManager, id: u64) -> Result<(), Box<dyn std::error::Error>> {
    session.initialize().await?;
    let client = session.client();

    let article = match client.get_article(id).await {
        Ok(article) => article,
        Err(err) if err.is_not_found() => {
            eprintln!("Article {id} not found");
            std::process::exit(1);
        }
        Err(err) if err.is_forbidden() || err.is_unauthorized() => {
            eprintln!("You do not have access to article {id}: {err}");
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let receipt = client.track_view(id).await;

    println!("# {}", article.title);
    println!(
        "by {} on {} [{:?}] — {} views",
        article.author.username,
        article.created_at.format("%Y-%m-%d"),
        article.status,
        receipt.view_count.max(article.view_count),
    );
    println!();
    println!("{}", article.content);
    Ok(())
}

pub async fn list(session: &SessionManager) -> Result<(), Box<dyn std::error::Error>> {
    session.initialize().await?;
    let articles = session.client().list_articles().await?;
    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }
    for article in articles {
        println!(
            "{:>6}  {:<10}  {:<20}  {}",
            article.id,
            format!("{:?}", article.status).to_lowercase(),
            article.author.username,
            article.title,
        );
    }
    Ok(())
}

pub async fn search(
    session: &SessionManager,
    args: SearchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    session.initialize().await?;
    let mut query = SearchQuery::new(args.query);
    query.page = args.page;
    let response = session.client().search_articles(&query).await?;

    println!(
        "{} result(s) for \"{}\"",
        response.count, response.search_info.query
    );
    for article in response.results {
        println!("{:>6}  {}", article.id, article.title);
    }
    Ok(())
}
