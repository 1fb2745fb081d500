use crate::server::ServerRouter;

mod comments;

pub fn routes() -> ServerRouter {
    ServerRouter::new().merge(comments::routes())
}
