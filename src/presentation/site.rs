use actix_files::{Files, NamedFile};
use actix_web::web;
use std::path::PathBuf;

/// Static frontend: `/` serves `index.html`, `/login` serves `login.html`,
/// every other path is looked up under `static_dir`. Mount after the API scope.
pub fn configure_site(static_dir: PathBuf) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let login_page = static_dir.join("login.html");
        cfg.route(
            "/login",
            web::get().to(move || {
                let login_page = login_page.clone();
                async move { NamedFile::open_async(login_page).await }
            }),
        )
        .service(Files::new("/", static_dir).index_file("index.html"));
    }
}
