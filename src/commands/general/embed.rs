use poise::{CreateReply, serenity_prelude as serenity};
use serenity::all::{CreateEmbed, CreateEmbedAuthor};

use crate::{CommandResult, Context};

/// Create an embed with a title and description
#[poise::command(slash_command, category = "General")]
pub async fn embed(
    ctx: Context<'_>,
    #[description = "title of the embed"] title: Option<String>,
    #[description = "description of the embed"] description: Option<String>,
    #[description = "color of the embed"]
    #[min = 0]
    #[max = 16777215]
    color: Option<u32>,
) -> CommandResult {
    let author = ctx.author();
    let embed = build_embed(
        title.as_deref(),
        description.as_deref(),
        color.unwrap_or(ctx.data().config.primary_color),
        &author.name,
        author.avatar_url(),
    );

    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn build_embed(
    title: Option<&str>,
    description: Option<&str>,
    color: u32,
    author_name: &str,
    avatar_url: Option<String>,
) -> CreateEmbed {
    let mut author = CreateEmbedAuthor::new(author_name);
    if let Some(url) = avatar_url {
        author = author.icon_url(url);
    }

    let mut embed = CreateEmbed::new().color(color).author(author);
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        embed = embed.title(title);
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        embed = embed.description(description);
    }
    embed
}
