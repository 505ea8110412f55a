mod collective {
    pub mod helpers;

    mod allreduce;
    mod barrier;
    mod broadcast;
    mod failure;
    mod reduce;
    mod scatter;
}
