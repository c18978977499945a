// handlers/protected/movies/mod.rs - movie catalog handlers
//
// Every route here sits behind a permission gate: `movies:read` for GET,
// `movies:write` for everything else.

pub mod create;
pub mod delete;
pub mod list;
pub mod show;
pub mod update;

pub use create::create_movie;
pub use delete::delete_movie;
pub use list::list_movies;
pub use show::show_movie;
pub use update::update_movie;
