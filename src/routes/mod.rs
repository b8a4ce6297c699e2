use actix_web::web;

pub mod admin;
pub mod auth;
pub mod files;
pub mod followships;
pub mod health;
pub mod tweets;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .route("", web::post().to(auth::register))
                    .route("/signin", web::post().to(auth::signin))
                    .route("/{id}", web::get().to(users::get_user))
                    .route("/{id}/account", web::put().to(users::update_account))
                    .route("/{id}/profile", web::put().to(users::update_profile))
                    .route("/{id}/tweets", web::get().to(users::get_user_tweets))
                    .route(
                        "/{id}/replied_tweets",
                        web::get().to(users::get_user_replied_tweets),
                    )
                    .route("/{id}/likes", web::get().to(users::get_user_likes))
                    .route("/{id}/followers", web::get().to(users::get_followers))
                    .route("/{id}/followings", web::get().to(users::get_followings)),
            )
            .service(
                web::scope("/admin")
                    .route("/signin", web::post().to(auth::admin_signin))
                    .route("/users", web::get().to(admin::list_users))
                    .route("/tweets/{id}", web::delete().to(admin::delete_tweet)),
            )
            .service(
                web::scope("/tweets")
                    .route("", web::get().to(tweets::list_tweets))
                    .route("", web::post().to(tweets::create_tweet))
                    .route("/{id}", web::get().to(tweets::get_tweet))
                    .route("/{id}/replies", web::get().to(tweets::list_replies))
                    .route("/{id}/replies", web::post().to(tweets::create_reply))
                    .route("/{id}/like", web::post().to(tweets::like_tweet))
                    .route("/{id}/unlike", web::post().to(tweets::unlike_tweet)),
            )
            .service(
                web::scope("/followships")
                    .route("", web::post().to(followships::follow))
                    .route("/{id}", web::delete().to(followships::unfollow)),
            ),
    )
    .route("/health", web::get().to(health::health_check))
    .route("/files/{id}/{filename:.*}", web::get().to(files::get_file));
}
