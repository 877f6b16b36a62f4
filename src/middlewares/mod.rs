pub mod actor_middleware;
