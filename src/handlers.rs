use crate::{
    AppState,
    auth::{AuthUser, CurrentUser, SessionUser, expired_session_cookie, issue_session_token, session_cookie},
    error::{AppError, Result},
    models::{CredentialsForm, Post, PostForm},
    password::{hash_password, verify_password},
    repository::RepositoryState,
    views::{AuthFormKind, AuthFormView, IndexView, PostFormMode, PostFormView},
};
use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;

/// A form body as handlers receive it: the rejection is held back so auth and ownership
/// checks decide the response before a malformed body does.
type FormBody<T> = std::result::Result<Form<T>, FormRejection>;

// --- Ownership Check ---

/// load_owned_post
///
/// Loads post `id` for modification by `user_id`.
///
/// * `AppError::NotFound` (404) if the post does not exist.
/// * `AppError::Forbidden` (403) if it exists but was written by someone else.
pub async fn load_owned_post(repo: &RepositoryState, id: i64, user_id: i64) -> Result<Post> {
    let post = repo
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::post_not_found(id))?;

    if !post.is_owned_by(user_id) {
        tracing::warn!(post_id = id, user_id, author_id = post.author_id, "Rejected edit by non-author");
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

// --- Blog Handlers ---

/// index
///
/// [Public Route] Lists every post, newest first. Edit links are rendered only on the
/// viewer's own posts.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Post listing (HTML)", content_type = "text/html", body = String))
)]
pub async fn index(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let posts = state.repo.list_posts().await?;
    Ok(Html(IndexView::new(user, posts).render()))
}

/// create_form
///
/// [Authenticated Route] Renders an empty post form.
#[utoipa::path(
    get,
    path = "/create",
    responses(
        (status = 200, description = "New post form (HTML)", content_type = "text/html", body = String),
        (status = 303, description = "Not logged in; redirects to /auth/login")
    )
)]
pub async fn create_form(user: AuthUser) -> Html<String> {
    Html(
        PostFormView {
            user: user.into(),
            mode: PostFormMode::Create,
            title: String::new(),
            body: String::new(),
            error: None,
        }
        .render(),
    )
}

/// create_post
///
/// [Authenticated Route] Creates a post owned by the session user.
/// An empty title re-renders the form with "Title is required" and saves nothing.
#[utoipa::path(
    post,
    path = "/create",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Created; redirects to /, or to /auth/login when not logged in"),
        (status = 200, description = "Validation failed; form re-rendered (HTML)", content_type = "text/html", body = String)
    )
)]
pub async fn create_post(
    user: AuthUser,
    State(state): State<AppState>,
    form: FormBody<PostForm>,
) -> Result<Response> {
    let Form(form) = form?;

    if let Err(message) = form.validate() {
        let view = PostFormView {
            user: user.into(),
            mode: PostFormMode::Create,
            title: form.title,
            body: form.body,
            error: Some(message.to_string()),
        };
        return Ok(Html(view.render()).into_response());
    }

    let post = state.repo.create_post(&form.title, &form.body, user.id).await?;
    tracing::info!(post_id = post.id, author_id = user.id, "Post created");
    Ok(Redirect::to("/").into_response())
}

/// update_form
///
/// [Authenticated Route] Renders the edit form for one of the user's own posts.
#[utoipa::path(
    get,
    path = "/{id}/update",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Edit form (HTML)", content_type = "text/html", body = String),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update_form(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let post = load_owned_post(&state.repo, id, user.id).await?;
    Ok(Html(
        PostFormView {
            user: user.into(),
            mode: PostFormMode::Update {
                id,
                stored_title: post.title.clone(),
            },
            title: post.title,
            body: post.body,
            error: None,
        }
        .render(),
    ))
}

/// update_post
///
/// [Authenticated Route] Replaces the title and body of one of the user's own posts.
///
/// *Authorization*: the ownership check runs before the form body is looked at, so a
/// non-author always gets 403 and a missing post always gets 404.
#[utoipa::path(
    post,
    path = "/{id}/update",
    params(("id" = i64, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated; redirects to /"),
        (status = 200, description = "Validation failed; form re-rendered (HTML)", content_type = "text/html", body = String),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    form: FormBody<PostForm>,
) -> Result<Response> {
    let post = load_owned_post(&state.repo, id, user.id).await?;
    let Form(form) = form?;

    if let Err(message) = form.validate() {
        let view = PostFormView {
            user: user.into(),
            mode: PostFormMode::Update {
                id,
                stored_title: post.title,
            },
            title: form.title,
            body: form.body,
            error: Some(message.to_string()),
        };
        return Ok(Html(view.render()).into_response());
    }

    if !state.repo.update_post(id, &form.title, &form.body).await? {
        // Deleted between the ownership check and the update.
        return Err(AppError::post_not_found(id));
    }
    tracing::info!(post_id = id, author_id = user.id, "Post updated");
    Ok(Redirect::to("/").into_response())
}

/// delete_post
///
/// [Authenticated Route] Deletes one of the user's own posts. Deleting a post that
/// does not exist is a 404, not a silent success.
#[utoipa::path(
    post,
    path = "/{id}/delete",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Deleted; redirects to /"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such post")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    load_owned_post(&state.repo, id, user.id).await?;

    if !state.repo.delete_post(id).await? {
        return Err(AppError::post_not_found(id));
    }
    tracing::info!(post_id = id, author_id = user.id, "Post deleted");
    Ok(Redirect::to("/"))
}

// --- Auth Handlers ---

fn auth_form(
    user: Option<SessionUser>,
    kind: AuthFormKind,
    username: String,
    error: Option<String>,
) -> Html<String> {
    Html(
        AuthFormView {
            user,
            kind,
            username,
            error,
        }
        .render(),
    )
}

/// register_form
///
/// [Public Route] Renders the registration form.
#[utoipa::path(
    get,
    path = "/auth/register",
    responses((status = 200, description = "Registration form (HTML)", content_type = "text/html", body = String))
)]
pub async fn register_form(CurrentUser(user): CurrentUser) -> Html<String> {
    auth_form(user, AuthFormKind::Register, String::new(), None)
}

/// register
///
/// [Public Route] Creates an account with an Argon2id password hash, then sends the
/// user to the login page. Validation failures and taken usernames re-render the form.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered; redirects to /auth/login"),
        (status = 200, description = "Validation failed; form re-rendered (HTML)", content_type = "text/html", body = String)
    )
)]
pub async fn register(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    form: FormBody<CredentialsForm>,
) -> Result<Response> {
    let Form(form) = form?;

    if let Err(message) = form.validate() {
        let page = auth_form(user, AuthFormKind::Register, form.username, Some(message.into()));
        return Ok(page.into_response());
    }

    let password_hash = hash_password(&form.password)?;
    match state.repo.create_user(&form.username, &password_hash).await {
        Ok(created) => {
            tracing::info!(user_id = created.id, "User registered");
            Ok(Redirect::to("/auth/login").into_response())
        }
        Err(taken @ AppError::UsernameTaken(_)) => {
            let page = auth_form(user, AuthFormKind::Register, form.username, Some(taken.to_string()));
            Ok(page.into_response())
        }
        Err(e) => Err(e),
    }
}

/// login_form
///
/// [Public Route] Renders the login form.
#[utoipa::path(
    get,
    path = "/auth/login",
    responses((status = 200, description = "Login form (HTML)", content_type = "text/html", body = String))
)]
pub async fn login_form(CurrentUser(user): CurrentUser) -> Html<String> {
    auth_form(user, AuthFormKind::Login, String::new(), None)
}

/// login
///
/// [Public Route] Checks the credentials and, on success, replaces any existing session
/// with a fresh signed `session` cookie.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = CredentialsForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in; sets the session cookie and redirects to /"),
        (status = 200, description = "Bad credentials; form re-rendered (HTML)", content_type = "text/html", body = String)
    )
)]
pub async fn login(
    CurrentUser(current): CurrentUser,
    State(state): State<AppState>,
    jar: CookieJar,
    form: FormBody<CredentialsForm>,
) -> Result<Response> {
    let Form(form) = form?;

    let error = match state.repo.get_user_by_username(&form.username).await? {
        None => "Incorrect username.",
        Some(user) if !verify_password(&form.password, &user.password_hash)? => "Incorrect password.",
        Some(user) => {
            let token = issue_session_token(&state.config, user.id)?;
            tracing::info!(user_id = user.id, "User logged in");
            let jar = jar.add(session_cookie(&state.config, token));
            return Ok((jar, Redirect::to("/")).into_response());
        }
    };

    Ok(auth_form(current, AuthFormKind::Login, form.username, Some(error.into())).into_response())
}

/// logout
///
/// [Public Route] Clears the session cookie.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses((status = 303, description = "Session cleared; redirects to /"))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(expired_session_cookie()), Redirect::to("/"))
}
