//! Server-side HTML for the catalog page.
//!
//! The page is a header, a search form that submits `search` back to
//! `/films`, and one of four bodies chosen by the catalog render. Markup is
//! built from dioxus components and rendered to a string with `dioxus-ssr`,
//! which escapes every interpolated text and attribute value.

use dioxus::prelude::*;

use filmcat_core::{CatalogRender, FilmCard, Poster, POSTER_PLACEHOLDER};

pub const PAGE_TITLE: &str = "Browse Films";
pub const PAGE_SUBTITLE: &str = "Discover and book tickets for the latest movies";
pub const SEARCH_PLACEHOLDER: &str = "Search films by title or genre...";

/// Render the whole catalog page.
pub fn render_page(search_term: &str, render: &CatalogRender) -> String {
    let mut dom = VirtualDom::new_with_props(
        CatalogPage,
        CatalogPageProps {
            search_term: search_term.to_string(),
            render: render.clone(),
        },
    );
    dom.rebuild_in_place();
    format!("<!DOCTYPE html>\n{}", dioxus_ssr::render(&dom))
}

#[derive(Clone, PartialEq, Props)]
pub struct CatalogPageProps {
    search_term: String,
    render: CatalogRender,
}

#[component]
pub fn CatalogPage(props: CatalogPageProps) -> Element {
    let state = props.render.state();

    let body = match &props.render {
        CatalogRender::Loading { skeletons } => rsx! {
            div { class: "film-grid",
                for _ in 0..*skeletons {
                    SkeletonCard {}
                }
            }
        },
        CatalogRender::Populated { cards } => rsx! {
            div { class: "film-grid",
                for card in cards.iter() {
                    FilmTile { key: "{card.id}", card: card.clone() }
                }
            }
        },
        CatalogRender::Empty { message } => rsx! {
            p { class: "empty", "{message}" }
        },
        CatalogRender::Error { message, detail } => rsx! {
            ErrorBody { message: message.clone(), detail: detail.clone() }
        },
    };

    rsx! {
        html { lang: "en",
            head {
                meta { charset: "utf-8" }
                title { "{PAGE_TITLE}" }
            }
            body {
                main { class: "catalog",
                    CatalogHeader {}
                    SearchBar { term: props.search_term.clone() }
                    section { class: "catalog-body", "data-state": "{state}", {body} }
                }
            }
        }
    }
}

#[component]
fn CatalogHeader() -> Element {
    rsx! {
        header { class: "catalog-header",
            h1 { "{PAGE_TITLE}" }
            p { class: "subtitle", "{PAGE_SUBTITLE}" }
        }
    }
}

#[component]
fn SearchBar(term: String) -> Element {
    rsx! {
        form { class: "search-bar", method: "get", action: "/films",
            input {
                class: "form-input",
                r#type: "search",
                name: "search",
                placeholder: "{SEARCH_PLACEHOLDER}",
                value: "{term}",
            }
        }
    }
}

#[component]
fn SkeletonCard() -> Element {
    rsx! {
        div { class: "film-card film-card-loading",
            div { class: "skeleton poster" }
            div { class: "skeleton line" }
            div { class: "skeleton line short" }
        }
    }
}

#[component]
fn FilmTile(card: FilmCard) -> Element {
    rsx! {
        a { class: "film-card", href: "{card.href}", "data-film-id": "{card.id}",
            match &card.poster {
                Poster::Url(url) => rsx! {
                    img { class: "poster", src: "{url}", alt: "{card.title}", loading: "lazy" }
                },
                Poster::Placeholder => rsx! {
                    div { class: "poster poster-placeholder", "{POSTER_PLACEHOLDER}" }
                },
            }
            span { class: "view-details", "View Details" }
            div { class: "film-card-info",
                h2 { class: "title", "{card.title}" }
                p { class: "meta",
                    span { class: "rating", "★ {card.rating}" }
                    " "
                    span { class: "duration", "{card.duration}" }
                }
                span { class: "genre", "{card.genre}" }
            }
        }
    }
}

#[component]
fn ErrorBody(message: String, detail: String) -> Element {
    rsx! {
        div { class: "error", role: "alert",
            p { "{message}" }
            if !detail.is_empty() {
                p { class: "error-detail", "{detail}" }
            }
        }
    }
}
