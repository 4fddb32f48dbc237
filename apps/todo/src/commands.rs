use domain_todos::{Repositories, Tag, Todo, TodoService};
use eyre::{Result, eyre};

use crate::{Commands, TagCommands};

pub async fn run(
    repositories: &Repositories,
    service: &TodoService,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Add { description } => {
            let todo = service.create_todo(&description).await?;
            println!("Added {todo}");
        }
        Commands::List { done, open } => {
            let todos = match (done, open) {
                (true, _) => service.get_todos_by_done(true).await?,
                (_, true) => service.get_todos_by_done(false).await?,
                _ => service.get_all_todos().await?,
            };
            print_todos(&todos);
        }
        Commands::Search { keyword } => {
            print_todos(&service.search_todos(keyword.as_deref()).await?);
        }
        Commands::Show { id } => {
            let todo = found(service.get_todo(id).await?, "todo", id)?;
            println!("{todo}");
        }
        Commands::Done { id } => {
            let todo = found(service.mark_todo_complete(id).await?, "todo", id)?;
            println!("{todo}");
        }
        Commands::Undone { id } => {
            let todo = found(service.mark_todo_incomplete(id).await?, "todo", id)?;
            println!("{todo}");
        }
        Commands::Toggle { id } => {
            let todo = found(service.toggle_todo_done(id).await?, "todo", id)?;
            println!("{todo}");
        }
        Commands::Edit { id, description } => {
            let todo = found(
                service.update_todo_description(id, &description).await?,
                "todo",
                id,
            )?;
            println!("{todo}");
        }
        Commands::Delete { id } => {
            service.delete_todo(id).await?;
            println!("Deleted todo #{id}");
        }
        Commands::Tag { command } => run_tag(service, command).await?,
        Commands::Status => status(repositories).await?,
    }
    Ok(())
}

async fn run_tag(service: &TodoService, command: TagCommands) -> Result<()> {
    match command {
        TagCommands::Add { name } => {
            let tag = service.create_tag(&name).await?;
            println!("Added {tag}");
        }
        TagCommands::List => print_tags(&service.get_all_tags().await?),
        TagCommands::Search { keyword } => {
            print_tags(&service.search_tags(keyword.as_deref()).await?);
        }
        TagCommands::Rename { id, name } => {
            let tag = found(service.rename_tag(id, &name).await?, "tag", id)?;
            println!("{tag}");
        }
        TagCommands::Delete { id } => {
            service.delete_tag(id).await?;
            println!("Deleted tag #{id}");
        }
        TagCommands::Attach { todo_id, tag_id } => {
            let todo = service.add_tag_to_todo(todo_id, tag_id).await?;
            let todo = todo.ok_or_else(|| eyre!("todo #{todo_id} or tag #{tag_id} not found"))?;
            println!("{todo}");
        }
        TagCommands::Detach { todo_id, tag_id } => {
            let todo = service.remove_tag_from_todo(todo_id, tag_id).await?;
            let todo = todo.ok_or_else(|| eyre!("todo #{todo_id} or tag #{tag_id} not found"))?;
            println!("{todo}");
        }
    }
    Ok(())
}

async fn status(repositories: &Repositories) -> Result<()> {
    let health = repositories.health().await;
    println!("backend:   {}", repositories.backend());
    println!("connected: {}", repositories.is_connected());
    println!("healthy:   {} ({} ms)", health.healthy, health.response_time_ms);
    if let Some(message) = health.message {
        println!("message:   {message}");
    }
    Ok(())
}

fn found<T>(value: Option<T>, kind: &str, id: i32) -> Result<T> {
    value.ok_or_else(|| eyre!("{kind} #{id} not found"))
}

fn print_todos(todos: &[Todo]) {
    if todos.is_empty() {
        println!("No todos");
    }
    for todo in todos {
        println!("{todo}");
    }
}

fn print_tags(tags: &[Tag]) {
    if tags.is_empty() {
        println!("No tags");
    }
    for tag in tags {
        println!("{tag}");
    }
}
